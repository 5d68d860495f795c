//! Live connector cache keyed by binding name.
//!
//! # Responsibilities
//! - Enumerate the binding names of one connector type
//! - Build typed options lazily on first `get`
//! - Rebuild stale options at most once per generation per binding
//!
//! # Get Algorithm
//! ```text
//! g = bus generation                         (lock-free)
//! entry current for g?         → return cached options
//! lock entry
//!   g = bus generation (re-read)
//!   entry current for g?       → another caller rebuilt; return it
//!   tree = store.current()     (loaded after g, so tree >= g)
//!   bind(view of tree) → install(options, g)
//! unlock
//! ```
//!
//! # Design Decisions
//! - Per-entry locks only; no global serialization of gets
//! - Unknown names are rejected before an entry is created
//! - A failed rebuild keeps the previous options and the stale stamp, so
//!   the next get retries

use std::sync::Arc;
use dashmap::DashMap;

use crate::connectors::binder::OptionsBinder;
use crate::connectors::entry::{ConnectorEntry, EntryState};
use crate::connectors::types::{ConnectorError, ConnectorResult};
use crate::environment::store::EnvironmentStore;
use crate::observability::metrics;

/// Per-connector-type registry of live options.
pub struct ConnectorFactory<B: OptionsBinder> {
    store: Arc<EnvironmentStore>,
    binder: B,
    entries: DashMap<String, Arc<ConnectorEntry<B::Options>>>,
}

impl<B: OptionsBinder> ConnectorFactory<B> {
    /// Create a factory reading from `store`.
    pub fn new(store: Arc<EnvironmentStore>, binder: B) -> Self {
        tracing::debug!(connector = binder.connector_name(), "Connector factory created");
        Self {
            store,
            binder,
            entries: DashMap::new(),
        }
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    pub fn store(&self) -> &Arc<EnvironmentStore> {
        &self.store
    }

    /// Binding names currently known to this connector, in ingestion order.
    ///
    /// Names listed by [`Self::ambiguous_binding_names`] appear here too, but
    /// `get` fails for them with `AmbiguousBindingName`.
    pub fn service_binding_names(&self) -> Vec<String> {
        self.binder.selector().names(&self.store.current())
    }

    /// Names bound under more than one service type this connector selects.
    pub fn ambiguous_binding_names(&self) -> Vec<String> {
        self.binder.selector().ambiguous_names(&self.store.current())
    }

    /// The binding's current options, rebuilding them if stale.
    pub fn get(&self, name: &str) -> ConnectorResult<Arc<B::Options>> {
        let generation = self.store.generation();

        if let Some(entry) = self.entry(name) {
            if let Some(options) = entry.current(generation) {
                metrics::record_cache_hit(self.binder.connector_name());
                return Ok(options);
            }
            return self.rebuild(&entry);
        }

        if !self.binder.selector().contains(&self.store.current(), name) {
            return Err(ConnectorError::UnknownBindingName {
                name: name.to_string(),
            });
        }
        let entry = Arc::clone(
            self.entries
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(ConnectorEntry::new(name)))
                .value(),
        );
        self.rebuild(&entry)
    }

    /// Lifecycle state of a binding's entry, if one was ever created.
    pub fn state(&self, name: &str) -> Option<EntryState> {
        self.entry(name)
            .map(|entry| entry.state(self.store.generation()))
    }

    fn entry(&self, name: &str) -> Option<Arc<ConnectorEntry<B::Options>>> {
        self.entries.get(name).map(|e| Arc::clone(e.value()))
    }

    fn rebuild(&self, entry: &ConnectorEntry<B::Options>) -> ConnectorResult<Arc<B::Options>> {
        let connector = self.binder.connector_name();
        let _guard = entry.lock();

        let generation = self.store.generation();
        if let Some(options) = entry.current(generation) {
            metrics::record_cache_hit(connector);
            return Ok(options);
        }

        let tree = self.store.current();
        let view = self.binder.selector().view(&tree, entry.name())?;
        tracing::debug!(connector, binding = entry.name(), generation, "Rebuilding connector options");

        match self.binder.bind(&view) {
            Ok(options) => {
                let options = Arc::new(options);
                entry.install(Arc::clone(&options), generation);
                metrics::record_rebuild(connector, "success");
                tracing::info!(connector, binding = entry.name(), generation, "Connector options rebuilt");
                Ok(options)
            }
            Err(source) => {
                metrics::record_rebuild(connector, "failure");
                tracing::warn!(
                    connector,
                    binding = entry.name(),
                    generation,
                    error = %source,
                    "Connector options rebuild failed; keeping previous options"
                );
                Err(ConnectorError::BindingRebuildFailed {
                    name: entry.name().to_string(),
                    source,
                })
            }
        }
    }
}
