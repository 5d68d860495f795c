//! Document file watcher for live reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::environment::reader::FileSettingsReader;
use crate::environment::store::EnvironmentStore;

/// Watches document files and republishes the store when any of them changes.
pub struct SourceWatcher {
    reader: FileSettingsReader,
    store: Arc<EnvironmentStore>,
    poll_interval: Duration,
}

impl SourceWatcher {
    /// Create a watcher over every path configured in `reader`.
    pub fn new(reader: FileSettingsReader, store: Arc<EnvironmentStore>, poll_interval: Duration) -> Self {
        Self {
            reader,
            store,
            poll_interval,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// Parent directories are watched rather than the files themselves so
    /// that editors replacing a file by rename are still observed.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let watched: Vec<PathBuf> = self.reader.paths().iter().map(|p| normalize(p)).collect();
        let mut directories: Vec<PathBuf> = watched
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();
        directories.sort();
        directories.dedup();

        let reader = self.reader;
        let store = self.store;
        let targets = watched.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    if !event.paths.iter().any(|p| targets.contains(&normalize(p))) {
                        return;
                    }
                    tracing::info!(paths = ?event.paths, "Document change detected, reloading...");
                    match store.reload(&reader) {
                        Ok(generation) => tracing::debug!(generation, "Reload applied"),
                        Err(e) => tracing::error!(
                            "Failed to reload platform documents: {}. Keeping current configuration.",
                            e
                        ),
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        for directory in &directories {
            watcher.watch(directory, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(paths = ?watched, "Document watcher started");
        Ok(watcher)
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
