//! Platform environment ingestion.
//!
//! # Data Flow
//! ```text
//! VCAP_APPLICATION / VCAP_SERVICES / settings file
//!     → reader.rs (raw text)
//!     → snapshot.rs (parse, immutable BindingSnapshot)
//!     → merge.rs (flatten.rs + binding-name index → ConfigTree)
//!     → store.rs (atomic swap, then ChangeBus::notify)
//!
//! On file change:
//!     watcher.rs detects change
//!     → store.rs reloads every document
//!     → consumers observe the new generation
//! ```
//!
//! # Design Decisions
//! - Ingestion is all-or-nothing: no partial or degraded tree
//! - The tree is immutable; changes replace it wholesale
//! - Keys are case-sensitive colon-delimited paths

pub mod flatten;
pub mod merge;
pub mod reader;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod watcher;

pub use flatten::{flatten, unflatten, FlatMap, KEY_DELIMITER};
pub use merge::{ConfigTree, InstanceMetadata, ServiceBinding};
pub use reader::{EnvSettingsReader, FileSettingsReader, MemorySettingsReader, SettingsReader};
pub use snapshot::BindingSnapshot;
pub use store::EnvironmentStore;
pub use types::{DocumentKind, IngestError};
