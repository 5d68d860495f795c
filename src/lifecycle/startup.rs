//! Startup orchestration.
//!
//! # Order
//! ```text
//! HostConfig → reader → ingest (fail fast) → ChangeBus + store → factories → watcher
//! ```
//!
//! # Design Decisions
//! - Fail fast: any ingestion error is fatal at startup
//! - The watcher starts last, after the first tree is in place

use std::sync::Arc;
use std::time::Duration;
use notify::RecommendedWatcher;
use thiserror::Error;

use crate::config::HostConfig;
use crate::connectors::{ConnectorFactory, PostgresBinder};
use crate::environment::reader::FileSettingsReader;
use crate::environment::store::EnvironmentStore;
use crate::environment::types::IngestError;
use crate::environment::watcher::SourceWatcher;
use crate::lifecycle::change_bus::ChangeBus;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Failed to start document watcher: {0}")]
    Watch(#[from] notify::Error),
}

/// The composition root: owns the bus, the store and the connector factories.
pub struct BindingsHost {
    pub bus: Arc<ChangeBus>,
    pub store: Arc<EnvironmentStore>,
    pub reader: Arc<FileSettingsReader>,
    pub postgres: ConnectorFactory<PostgresBinder>,
    _watcher: Option<RecommendedWatcher>,
}

impl BindingsHost {
    /// Ingest the platform documents and wire every component.
    pub fn start(config: &HostConfig) -> Result<Self, StartupError> {
        let reader = Arc::new(FileSettingsReader {
            application_path: config.sources.application_path.clone(),
            services_path: config.sources.services_path.clone(),
            settings_path: config.sources.settings_path.clone(),
        });

        let bus = Arc::new(ChangeBus::new());
        let store = Arc::new(EnvironmentStore::from_reader(reader.as_ref(), Arc::clone(&bus))?);
        let postgres = ConnectorFactory::new(Arc::clone(&store), PostgresBinder::new());

        let watcher = if config.watch.enabled {
            let watcher = SourceWatcher::new(
                reader.as_ref().clone(),
                Arc::clone(&store),
                Duration::from_secs(config.watch.poll_interval_secs),
            );
            Some(watcher.run()?)
        } else {
            None
        };

        tracing::info!(
            watch = config.watch.enabled,
            postgres_bindings = postgres.service_binding_names().len(),
            "Bindings host started"
        );

        Ok(Self {
            bus,
            store,
            reader,
            postgres,
            _watcher: watcher,
        })
    }
}
