//! Platform service bindings as a live configuration tree.
//!
//! Platform-provided JSON documents (an application descriptor and a set of
//! named service-credential bindings) are flattened into one colon-delimited
//! key tree. Connector factories project named subtrees onto typed options
//! and keep them current as the documents change at runtime.

pub mod config;
pub mod connectors;
pub mod environment;
pub mod lifecycle;
pub mod observability;

pub use connectors::{ConnectorError, ConnectorFactory, OptionsBinder, PostgresBinder, PostgresOptions};
pub use environment::{flatten, ConfigTree, EnvironmentStore, IngestError};
pub use lifecycle::{BindingsHost, ChangeBus};
