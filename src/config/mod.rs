//! Host configuration subsystem.
//!
//! # Data Flow
//! ```text
//! host file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → CLI flags override individual fields (main.rs)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Platform documents are not configured here, only located

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{HostConfig, ObservabilityConfig, SourcesConfig, WatchConfig};
