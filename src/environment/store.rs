//! Live configuration tree.
//!
//! # Data Flow
//! ```text
//! replace_*/reload
//!     → parse (snapshot.rs)
//!     → merge + binding index (merge.rs)
//!     → atomic swap of Arc<ConfigTree>
//!     → ChangeBus::notify()
//! ```
//!
//! # Design Decisions
//! - The tree is swapped before the generation advances, so anyone who
//!   observes generation `g` and then loads the tree sees state >= `g`
//! - Writers are serialized from read to notify: `reload` reads its
//!   documents under the writer lock, so a slow reader can never publish
//!   older content over a newer commit
//! - Readers never take a lock
//! - A failed ingestion leaves the previous tree in place and signals nothing

use std::sync::{Arc, Mutex, PoisonError};
use arc_swap::ArcSwap;

use crate::environment::merge::{ConfigTree, InstanceMetadata};
use crate::environment::reader::{Documents, SettingsReader};
use crate::environment::snapshot::BindingSnapshot;
use crate::environment::types::{DocumentKind, IngestResult};
use crate::lifecycle::change_bus::ChangeBus;
use crate::observability::metrics;

/// Holds the current configuration tree and publishes replacements.
pub struct EnvironmentStore {
    tree: ArcSwap<ConfigTree>,
    documents: Mutex<Documents>,
    bus: Arc<ChangeBus>,
}

impl EnvironmentStore {
    /// A store with every document empty.
    pub fn new(bus: Arc<ChangeBus>) -> Self {
        Self {
            tree: ArcSwap::from_pointee(ConfigTree::default()),
            documents: Mutex::new(Documents::empty()),
            bus,
        }
    }

    /// Ingest every document from `reader`. Any ingestion error aborts.
    pub fn from_reader(reader: &dyn SettingsReader, bus: Arc<ChangeBus>) -> IngestResult<Self> {
        let documents = Documents::load(reader)?;
        let tree = build_tree(&documents)?;
        tracing::info!(
            values = tree.len(),
            bindings = tree.bindings().len(),
            "Platform environment ingested"
        );
        metrics::record_binding_count(tree.bindings().len());
        Ok(Self {
            tree: ArcSwap::from_pointee(tree),
            documents: Mutex::new(documents),
            bus,
        })
    }

    /// The bus this store publishes on.
    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    /// Current generation of the configuration.
    pub fn generation(&self) -> u64 {
        self.bus.generation()
    }

    /// The current tree. Lock-free.
    pub fn current(&self) -> Arc<ConfigTree> {
        self.tree.load_full()
    }

    /// Re-read every document from `reader` and publish the result.
    pub fn reload(&self, reader: &dyn SettingsReader) -> IngestResult<u64> {
        self.commit(|documents| {
            *documents = Documents::load(reader)?;
            Ok(())
        })
    }

    /// Replace the application document.
    pub fn replace_application(&self, text: &str) -> IngestResult<u64> {
        self.replace(DocumentKind::Application, text)
    }

    /// Replace the service-bindings document.
    pub fn replace_services(&self, text: &str) -> IngestResult<u64> {
        self.replace(DocumentKind::Services, text)
    }

    /// Replace the local settings document.
    pub fn replace_settings(&self, text: &str) -> IngestResult<u64> {
        self.replace(DocumentKind::Settings, text)
    }

    /// Replace the instance metadata.
    pub fn replace_instance(&self, instance: InstanceMetadata) -> IngestResult<u64> {
        self.commit(|documents| {
            documents.instance = instance;
            Ok(())
        })
    }

    fn replace(&self, kind: DocumentKind, text: &str) -> IngestResult<u64> {
        let snapshot = BindingSnapshot::parse(kind, text)?;
        self.commit(|documents| {
            match kind {
                DocumentKind::Application => documents.application = snapshot,
                DocumentKind::Services => documents.services = snapshot,
                DocumentKind::Settings => documents.settings = snapshot,
            }
            Ok(())
        })
    }

    fn commit(&self, update: impl FnOnce(&mut Documents) -> IngestResult<()>) -> IngestResult<u64> {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = documents.clone();
        update(&mut next)?;
        let tree = build_tree(&next)?;
        let bindings = tree.bindings().len();

        *documents = next;
        self.tree.store(Arc::new(tree));
        let generation = self.bus.notify();
        drop(documents);

        metrics::record_binding_count(bindings);
        tracing::info!(generation, bindings, "Configuration tree replaced");
        Ok(generation)
    }
}

fn build_tree(documents: &Documents) -> IngestResult<ConfigTree> {
    ConfigTree::merge(
        &documents.application,
        &documents.services,
        &documents.settings,
        &documents.instance,
    )
}
