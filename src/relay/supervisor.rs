//! Upstream supervisor
//!
//! Runs the connect → stream → delay cycle forever. One session is active
//! at a time; the next attempt starts only after the previous session has
//! fully ended and the fixed retry delay has elapsed. There is no attempt
//! limit.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use crate::client::Upstream;
use crate::registry::{ContentFraming, SubscriberRegistry};
use crate::session::{RelayPhase, RelayState};
use crate::stats::RelayStats;

use super::broadcaster::{Broadcaster, SessionOutcome};
use super::handle::{RelayEvent, RelayHandle};

const EVENT_CAPACITY: usize = 64;

/// Drives the upstream state machine
pub struct Supervisor<U: Upstream> {
    upstream: U,
    broadcaster: Broadcaster,
    retry_delay: Duration,
    state: RelayState,
    stats: Arc<RelayStats>,
    framing_tx: watch::Sender<ContentFraming>,
    phase_tx: watch::Sender<RelayPhase>,
    events: broadcast::Sender<RelayEvent>,
}

impl<U: Upstream> Supervisor<U> {
    /// Create a supervisor feeding `registry`
    ///
    /// Returns the supervisor and a handle for the HTTP side.
    pub fn new(
        upstream: U,
        registry: Arc<SubscriberRegistry>,
        retry_delay: Duration,
    ) -> (Self, RelayHandle) {
        let stats = Arc::new(RelayStats::new());
        let (framing_tx, framing_rx) = watch::channel(ContentFraming::default());
        let (phase_tx, phase_rx) = watch::channel(RelayPhase::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let handle = RelayHandle {
            registry: Arc::clone(&registry),
            stats: Arc::clone(&stats),
            framing: framing_rx,
            phase: phase_rx,
            events: events.clone(),
        };

        let supervisor = Self {
            upstream,
            broadcaster: Broadcaster::new(registry, Arc::clone(&stats)),
            retry_delay,
            state: RelayState::new(),
            stats,
            framing_tx,
            phase_tx,
            events,
        };

        (supervisor, handle)
    }

    /// Run until the task is dropped or aborted
    pub async fn run(mut self) {
        tracing::info!(
            retry_delay_ms = self.retry_delay.as_millis() as u64,
            "Upstream supervisor started"
        );

        loop {
            self.cycle().await;
        }
    }

    /// Run until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("Upstream supervisor stopped");
            }
            _ = self.run() => {}
        }
    }

    /// Spawn the supervisor on the current runtime
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn emit(&self, event: RelayEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn publish_phase(&self) {
        self.phase_tx.send_replace(self.state.phase());
    }

    /// One DISCONNECTED → ... → DISCONNECTED round
    async fn cycle(&mut self) {
        self.state.start_connect();
        self.publish_phase();

        let attempt = self.state.consecutive_failures + 1;
        self.emit(RelayEvent::Connecting { attempt });
        tracing::debug!(attempt = attempt, "Connecting to upstream");

        match self.upstream.connect().await {
            Ok(mut session) => {
                let declared = session.framing().cloned();
                let session_id = self.state.on_connected();

                // Without a declared type the previous descriptor stays
                if let Some(framing) = declared {
                    self.framing_tx.send_replace(framing);
                }
                let framing = self.framing_tx.borrow().clone();
                if framing.boundary().is_none() {
                    tracing::warn!(
                        mime_type = framing.mime_type(),
                        "Upstream framing declares no boundary"
                    );
                }

                self.stats.record_session();
                self.publish_phase();
                tracing::info!(
                    session_id = session_id,
                    framing = %framing,
                    subscribers = self.broadcaster.registry().len(),
                    "Upstream session started"
                );
                self.emit(RelayEvent::Connected {
                    session_id,
                    framing,
                });

                let outcome = self.broadcaster.pump(session_id, &mut session).await;
                let chunks = outcome.chunks();
                match outcome {
                    SessionOutcome::Ended { .. } => {
                        self.state.on_ended();
                        tracing::info!(
                            session_id = session_id,
                            chunks = chunks,
                            "Upstream closed the stream"
                        );
                        self.emit(RelayEvent::SessionEnded { session_id, chunks });
                    }
                    SessionOutcome::Failed { error, .. } => {
                        self.state.on_stream_failed();
                        self.stats.record_stream_failure();
                        tracing::warn!(
                            session_id = session_id,
                            chunks = chunks,
                            error = %error,
                            "Upstream stream failed"
                        );
                        self.emit(RelayEvent::SessionFailed {
                            session_id,
                            chunks,
                            error: error.to_string(),
                        });
                    }
                }
            }
            Err(error) => {
                let failures = self.state.on_connect_failed();
                self.stats.record_connect_failure();
                tracing::warn!(
                    attempt = failures,
                    error = %error,
                    retry_in_ms = self.retry_delay.as_millis() as u64,
                    "Upstream connect failed"
                );
                self.emit(RelayEvent::ConnectFailed {
                    attempt: failures,
                    error: error.to_string(),
                });
            }
        }

        self.publish_phase();
        self.emit(RelayEvent::RetryScheduled {
            delay: self.retry_delay,
        });
        tokio::time::sleep(self.retry_delay).await;

        self.state.reset();
        self.publish_phase();
    }
}
