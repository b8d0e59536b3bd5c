//! Shared view of a running relay
//!
//! The supervisor owns the writing side of everything; the HTTP server and
//! embedders get a cheap, cloneable `RelayHandle`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::registry::{ContentFraming, SubscriberRegistry};
use crate::session::RelayPhase;
use crate::stats::RelayStats;

/// Lifecycle events emitted by the supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A connect attempt started (1-based within the current failure streak)
    Connecting { attempt: u32 },
    /// Session established with the given effective framing
    Connected {
        session_id: u64,
        framing: ContentFraming,
    },
    /// Connect attempt failed
    ConnectFailed { attempt: u32, error: String },
    /// Device closed the stream
    SessionEnded { session_id: u64, chunks: u64 },
    /// Stream broke mid-way
    SessionFailed {
        session_id: u64,
        chunks: u64,
        error: String,
    },
    /// Next attempt will start after this delay
    RetryScheduled { delay: Duration },
}

/// Cloneable handle to a relay's shared state
#[derive(Clone)]
pub struct RelayHandle {
    pub(super) registry: Arc<SubscriberRegistry>,
    pub(super) stats: Arc<RelayStats>,
    pub(super) framing: watch::Receiver<ContentFraming>,
    pub(super) phase: watch::Receiver<RelayPhase>,
    pub(super) events: broadcast::Sender<RelayEvent>,
}

impl RelayHandle {
    /// The subscriber registry
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Relay counters
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Latest committed framing descriptor
    ///
    /// Returns an owned copy; later reconnects do not affect it.
    pub fn framing(&self) -> ContentFraming {
        self.framing.borrow().clone()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> RelayPhase {
        *self.phase.borrow()
    }

    /// Subscribe to lifecycle events
    pub fn events(&self) -> broadcast::Receiver<RelayEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for RelayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHandle")
            .field("phase", &self.phase())
            .field("framing", &self.framing())
            .field("subscribers", &self.registry.len())
            .finish()
    }
}
