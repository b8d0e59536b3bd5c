//! Subscriber entry types
//!
//! This module defines the per-subscriber state stored in the registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::error::SubscriberWriteError;
use super::frame::{Chunk, SubscriberId};

/// Entry for a single subscriber in the registry
pub struct SubscriberEntry {
    /// Identity of the subscriber
    pub id: SubscriberId,

    /// Sending half of the subscriber's output channel
    pub(super) tx: mpsc::Sender<Chunk>,

    /// Chunks handed to this subscriber
    pub delivered: AtomicU64,

    /// When the subscriber joined
    pub joined_at: Instant,
}

impl SubscriberEntry {
    pub(super) fn new(id: SubscriberId, tx: mpsc::Sender<Chunk>) -> Self {
        Self {
            id,
            tx,
            delivered: AtomicU64::new(0),
            joined_at: Instant::now(),
        }
    }

    /// Hand a chunk to this subscriber without waiting
    ///
    /// A full queue means the client stopped reading; it is reported the
    /// same way as a closed connection so the caller drops the subscriber.
    pub(super) fn deliver(&self, chunk: Chunk) -> Result<(), SubscriberWriteError> {
        match self.tx.try_send(chunk) {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(SubscriberWriteError::Closed(self.id)),
            Err(TrySendError::Full(_)) => Err(SubscriberWriteError::Lagging(self.id)),
        }
    }

    /// Get the number of chunks delivered
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

/// Statistics for one subscriber
#[derive(Debug, Clone)]
pub struct SubscriberStats {
    /// Identity of the subscriber
    pub id: SubscriberId,
    /// Chunks delivered so far
    pub delivered: u64,
    /// Time since the subscriber joined
    pub connected_for: std::time::Duration,
}
