//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Host config → Ingest documents → Bus + store → Factories → Watcher
//!
//! Changes (change_bus.rs):
//!     store replaced → notify() → generation bump → subscribers woken
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown (shutdown.rs)
//!     SIGHUP → Reload platform documents
//! ```

pub mod change_bus;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use change_bus::{ChangeBus, ChangeSubscription};
pub use shutdown::Shutdown;
pub use startup::BindingsHost;
