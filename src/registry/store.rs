//! Subscriber registry implementation
//!
//! The live set of subscriber output channels. Adds and removals come from
//! the HTTP side at any time; the broadcaster iterates the set once per
//! chunk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc;

use super::config::RegistryConfig;
use super::entry::{SubscriberEntry, SubscriberStats};
use super::error::{RegistryError, SubscriberWriteError};
use super::frame::{Chunk, SubscriberId};

/// Outcome of broadcasting one chunk
#[derive(Debug, Clone, Default)]
pub struct BroadcastReport {
    /// Subscribers that accepted the chunk
    pub delivered: usize,
    /// Subscribers that failed and were removed
    pub dropped: Vec<SubscriberWriteError>,
}

/// Registry of connected subscribers
///
/// Thread-safe via a std `RwLock`: no critical section awaits, and removal
/// has to be callable from `Drop` when a client disconnects.
pub struct SubscriberRegistry {
    /// Map of subscriber id to entry
    subscribers: RwLock<HashMap<SubscriberId, Arc<SubscriberEntry>>>,

    /// Next id to hand out
    next_id: AtomicU64,

    /// Configuration
    config: RegistryConfig,
}

impl SubscriberRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SubscriberId, Arc<SubscriberEntry>>> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SubscriberId, Arc<SubscriberEntry>>> {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber
    ///
    /// Returns its id and the receiving half of its output channel. The
    /// subscriber sees every chunk broadcast after this call returns.
    pub fn add(&self) -> Result<(SubscriberId, mpsc::Receiver<Chunk>), RegistryError> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let mut subscribers = self.write();

        if self.config.max_subscribers > 0 && subscribers.len() >= self.config.max_subscribers {
            tracing::warn!(
                limit = self.config.max_subscribers,
                "Subscriber rejected: limit reached"
            );
            return Err(RegistryError::Full(self.config.max_subscribers));
        }

        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        subscribers.insert(id, Arc::new(SubscriberEntry::new(id, tx)));

        tracing::debug!(
            subscriber_id = %id,
            subscribers = subscribers.len(),
            "Subscriber added"
        );

        Ok((id, rx))
    }

    /// Remove a subscriber
    ///
    /// Returns false if it was already gone.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.write();
        let removed = subscribers.remove(&id).is_some();

        if removed {
            tracing::debug!(
                subscriber_id = %id,
                subscribers = subscribers.len(),
                "Subscriber removed"
            );
        }

        removed
    }

    /// Check if a subscriber is registered
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.read().contains_key(&id)
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no subscriber is registered
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<SubscriberEntry>> {
        self.read().values().cloned().collect()
    }

    /// Visit every subscriber registered at the time of the call
    ///
    /// Runs over a snapshot, so `f` may add or remove subscribers itself.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&SubscriberEntry),
    {
        for entry in self.snapshot() {
            f(&entry);
        }
    }

    /// Deliver a chunk to every registered subscriber
    ///
    /// Each delivery is independent. Subscribers whose channel is closed or
    /// full are removed before this returns; the rest are unaffected.
    pub fn broadcast(&self, chunk: &Chunk) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.for_each(|entry| match entry.deliver(chunk.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => report.dropped.push(e),
        });

        if !report.dropped.is_empty() {
            let mut subscribers = self.write();
            for failure in &report.dropped {
                subscribers.remove(&failure.subscriber());
                tracing::debug!(reason = %failure, "Subscriber dropped during broadcast");
            }
        }

        report
    }

    /// Get statistics for one subscriber
    pub fn subscriber_stats(&self, id: SubscriberId) -> Option<SubscriberStats> {
        self.read().get(&id).map(|entry| SubscriberStats {
            id,
            delivered: entry.delivered(),
            connected_for: entry.joined_at.elapsed(),
        })
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
