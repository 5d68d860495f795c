//! Live connector options.
//!
//! # Data Flow
//! ```text
//! caller → factory.rs get(name)
//!     → entry.rs (fast path: stamp == generation → cached Arc<Options>)
//!     → binder.rs (selector resolves name → credentials + local settings)
//!     → postgres.rs / credentials.rs (OptionsBinder::bind)
//!     → entry.rs install (options, then stamp)
//! ```
//!
//! # Design Decisions
//! - One factory per connector type, keyed by binding name
//! - Options are immutable `Arc`s; rebuilds swap, never mutate
//! - Errors are local to one get call

pub mod binder;
pub mod connection_string;
pub mod credentials;
pub mod entry;
pub mod factory;
pub mod postgres;
pub mod types;

pub use binder::{BindingView, OptionsBinder, ServiceSelector};
pub use credentials::{CredentialsBinder, CredentialsOptions};
pub use entry::EntryState;
pub use factory::ConnectorFactory;
pub use postgres::{PostgresBinder, PostgresOptions};
pub use types::{BindError, ConnectorError};
