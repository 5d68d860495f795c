//! Per-binding cache entry.
//!
//! # States
//! - Unbuilt: created, never successfully bound
//! - Current: stamp equals the bus generation
//! - Stale: stamp behind the bus generation
//!
//! # State Transitions
//! ```text
//! Unbuilt → Current: first successful rebuild
//! Current → Stale:   generation advanced by notify()
//! Stale → Current:   successful rebuild
//! Stale → Stale:     failed rebuild (cached options kept, retried on next get)
//! ```
//!
//! # Design Decisions
//! - Options are published before the stamp, so a reader that sees stamp
//!   `g` also sees options built for `g` or later
//! - The rebuild lock is per entry; entries never contend with each other

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use arc_swap::ArcSwapOption;

const UNBUILT: u64 = u64::MAX;

/// Observable lifecycle state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unbuilt,
    Current,
    Stale,
}

/// Cached options for one binding name.
#[derive(Debug)]
pub struct ConnectorEntry<O> {
    name: String,
    options: ArcSwapOption<O>,
    stamp: AtomicU64,
    rebuild_lock: Mutex<()>,
}

impl<O> ConnectorEntry<O> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: ArcSwapOption::empty(),
            stamp: AtomicU64::new(UNBUILT),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options if the entry is current for `generation`. Lock-free.
    pub fn current(&self, generation: u64) -> Option<Arc<O>> {
        if self.stamp.load(Ordering::Acquire) == generation {
            self.options.load_full()
        } else {
            None
        }
    }

    /// Last successfully built options, regardless of staleness.
    pub fn cached(&self) -> Option<Arc<O>> {
        self.options.load_full()
    }

    /// Generation the cached options were built for.
    pub fn stamp(&self) -> Option<u64> {
        match self.stamp.load(Ordering::Acquire) {
            UNBUILT => None,
            stamp => Some(stamp),
        }
    }

    pub fn state(&self, generation: u64) -> EntryState {
        match self.stamp() {
            None => EntryState::Unbuilt,
            Some(stamp) if stamp == generation => EntryState::Current,
            Some(_) => EntryState::Stale,
        }
    }

    /// Acquire the rebuild lock.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        // Guarded data is `()`: poisoning carries no state.
        self.rebuild_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish freshly built options for `generation`. Caller holds the lock.
    pub(crate) fn install(&self, options: Arc<O>, generation: u64) {
        self.options.store(Some(options));
        self.stamp.store(generation, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let entry: ConnectorEntry<String> = ConnectorEntry::new("db1");
        assert_eq!(entry.state(0), EntryState::Unbuilt);
        assert!(entry.current(0).is_none());

        {
            let _guard = entry.lock();
            entry.install(Arc::new("first".to_string()), 0);
        }
        assert_eq!(entry.state(0), EntryState::Current);
        assert_eq!(entry.current(0).as_deref().map(String::as_str), Some("first"));

        // Generation advanced elsewhere.
        assert_eq!(entry.state(1), EntryState::Stale);
        assert!(entry.current(1).is_none());
        assert_eq!(entry.cached().as_deref().map(String::as_str), Some("first"));

        entry.install(Arc::new("second".to_string()), 1);
        assert_eq!(entry.stamp(), Some(1));
        assert_eq!(entry.current(1).as_deref().map(String::as_str), Some("second"));
    }

    #[test]
    fn test_old_readers_keep_their_options() {
        let entry: ConnectorEntry<String> = ConnectorEntry::new("db1");
        entry.install(Arc::new("old".to_string()), 0);
        let held = entry.current(0).unwrap();
        entry.install(Arc::new("new".to_string()), 1);
        assert_eq!(held.as_str(), "old");
    }
}
