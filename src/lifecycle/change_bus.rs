//! Change notification bus.
//!
//! # Semantics
//! ```text
//! writer:  replace snapshot → notify() → generation += 1 → signal subscribers
//! reader:  generation() (lock-free) → compare with cached stamp
//! waiter:  subscription.changed().await → "re-check", no payload
//! ```
//!
//! # Design Decisions
//! - `notify()` never blocks and never waits on subscribers
//! - Signals coalesce: several notifies before a subscriber wakes look like one
//! - The generation counter advances synchronously inside `notify()`, so a
//!   caller that returns from `notify()` is guaranteed every later staleness
//!   check sees the bump, whether or not any subscriber has woken yet

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::observability::metrics;

/// Identifier of one subscription, unique per bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Process-local publish/subscribe primitive carrying the configuration generation.
#[derive(Debug)]
pub struct ChangeBus {
    generation: AtomicU64,
    next_id: AtomicU64,
    tx: watch::Sender<u64>,
}

impl ChangeBus {
    /// Create a bus at generation 0.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            generation: AtomicU64::new(0),
            next_id: AtomicU64::new(0),
            tx,
        }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Signal that some watched source changed. Returns the new generation.
    pub fn notify(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Concurrent notifiers may race here; keep the published value monotonic.
        self.tx.send_if_modified(|published| {
            if generation > *published {
                *published = generation;
                true
            } else {
                false
            }
        });
        metrics::record_config_change();
        tracing::debug!(generation, subscribers = self.tx.receiver_count(), "Configuration change signalled");
        generation
    }

    /// Register a new subscriber. Changes before this call are already seen.
    pub fn subscribe(&self) -> ChangeSubscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        ChangeSubscription {
            id,
            rx: self.tx.subscribe(),
        }
    }

    /// Drop a subscription. Equivalent to dropping the handle.
    pub fn unsubscribe(&self, subscription: ChangeSubscription) {
        tracing::debug!(id = subscription.id.0, "Change subscription removed");
        drop(subscription);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle returned by [`ChangeBus::subscribe`].
#[derive(Debug)]
pub struct ChangeSubscription {
    id: SubscriptionId,
    rx: watch::Receiver<u64>,
}

impl ChangeSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next change. Returns the latest generation, or `None`
    /// once the bus has been dropped.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// True if a change was signalled since the last `changed()`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Latest generation published to this subscriber.
    pub fn generation(&self) -> u64 {
        *self.rx.borrow()
    }
}
