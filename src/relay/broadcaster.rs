//! Chunk fan-out
//!
//! Pulls chunks off an upstream session and hands each one to every
//! registered subscriber, in arrival order. Nothing is buffered: a chunk
//! that arrives while nobody is subscribed is gone.

use std::sync::Arc;

use crate::error::Error;
use crate::registry::{BroadcastReport, Chunk, SubscriberRegistry};
use crate::session::UpstreamSession;
use crate::stats::RelayStats;

/// How a session's chunk sequence finished
#[derive(Debug)]
pub enum SessionOutcome {
    /// The device closed the stream
    Ended { chunks: u64 },
    /// A read error or stall ended the stream
    Failed { chunks: u64, error: Error },
}

impl SessionOutcome {
    /// Chunks received before the session finished
    pub fn chunks(&self) -> u64 {
        match self {
            SessionOutcome::Ended { chunks } | SessionOutcome::Failed { chunks, .. } => *chunks,
        }
    }
}

/// Fans upstream chunks out to the registry
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    stats: Arc<RelayStats>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>, stats: Arc<RelayStats>) -> Self {
        Self { registry, stats }
    }

    /// The registry chunks are delivered to
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Deliver one chunk to every current subscriber
    pub fn publish(&self, chunk: &Chunk) -> BroadcastReport {
        let report = self.registry.broadcast(chunk);

        self.stats
            .record_chunk(chunk.len(), report.delivered, report.dropped.len());

        if !report.dropped.is_empty() {
            tracing::debug!(
                session_id = chunk.session_id,
                sequence = chunk.sequence,
                dropped = report.dropped.len(),
                remaining = report.delivered,
                "Dropped subscribers during broadcast"
            );
        }

        report
    }

    /// Drive a session until its chunk sequence ends
    ///
    /// Subscriber failures never end the session; only the upstream does.
    pub async fn pump(&self, session_id: u64, session: &mut UpstreamSession) -> SessionOutcome {
        let mut sequence = 0u64;

        loop {
            match session.next_chunk().await {
                Some(Ok(data)) => {
                    if data.is_empty() {
                        continue;
                    }
                    let chunk = Chunk::new(session_id, sequence, data);
                    sequence += 1;
                    self.publish(&chunk);
                }
                Some(Err(error)) => {
                    return SessionOutcome::Failed {
                        chunks: sequence,
                        error,
                    };
                }
                None => return SessionOutcome::Ended { chunks: sequence },
            }
        }
    }
}
