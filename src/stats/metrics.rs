//! Statistics and metrics for the relay

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Relay-wide counters
///
/// Updated from the supervisor task and the HTTP handlers; all counters
/// are monotonic.
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    sessions: AtomicU64,
    connect_failures: AtomicU64,
    stream_failures: AtomicU64,
    chunks_received: AtomicU64,
    bytes_received: AtomicU64,
    chunks_delivered: AtomicU64,
    subscribers_total: AtomicU64,
    subscribers_dropped: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelayStatsSnapshot {
    /// Seconds since the relay started
    pub uptime_secs: u64,
    /// Upstream sessions established
    pub sessions: u64,
    /// Failed connect attempts
    pub connect_failures: u64,
    /// Sessions that ended with a read error
    pub stream_failures: u64,
    /// Chunks read from upstream
    pub chunks_received: u64,
    /// Bytes read from upstream
    pub bytes_received: u64,
    /// Chunk deliveries across all subscribers
    pub chunks_delivered: u64,
    /// Subscribers ever accepted
    pub subscribers_total: u64,
    /// Subscribers removed because a delivery failed
    pub subscribers_dropped: u64,
}

impl RelayStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            sessions: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            stream_failures: AtomicU64::new(0),
            chunks_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            chunks_delivered: AtomicU64::new(0),
            subscribers_total: AtomicU64::new(0),
            subscribers_dropped: AtomicU64::new(0),
        }
    }

    pub fn record_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream_failure(&self) {
        self.stream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one upstream chunk and its fan-out result
    pub fn record_chunk(&self, bytes: usize, delivered: usize, dropped: usize) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
        self.chunks_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.subscribers_dropped
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn record_subscriber(&self) {
        self.subscribers_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Time since the relay started
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            sessions: self.sessions.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            stream_failures: self.stream_failures.load(Ordering::Relaxed),
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            chunks_delivered: self.chunks_delivered.load(Ordering::Relaxed),
            subscribers_total: self.subscribers_total.load(Ordering::Relaxed),
            subscribers_dropped: self.subscribers_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayStatsSnapshot {
    /// Average upstream bitrate over the relay's lifetime, bits per second
    pub fn bitrate(&self) -> u64 {
        if self.uptime_secs > 0 {
            (self.bytes_received * 8) / self.uptime_secs
        } else {
            0
        }
    }
}
