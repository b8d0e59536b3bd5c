//! Upstream session state machine
//!
//! Tracks the relay's upstream side from connect attempt to end of stream,
//! over and over for the life of the process.
//!
//! ```text
//! DISCONNECTED --connect()--> CONNECTING
//! CONNECTING --success--> STREAMING
//! CONNECTING --failure--> FAILED
//! STREAMING --upstream close--> ENDED
//! STREAMING --read error--> FAILED
//! ENDED/FAILED --after fixed delay--> DISCONNECTED
//! ```

use serde::Serialize;

/// Relay lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayPhase {
    /// No upstream connection, next attempt pending
    Disconnected,
    /// Connect attempt in progress
    Connecting,
    /// Session established, chunks flowing
    Streaming,
    /// Session ended by the device closing the stream
    Ended,
    /// Connect attempt or session failed
    Failed,
}

impl RelayPhase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_transition_to(self, next: RelayPhase) -> bool {
        use RelayPhase::*;

        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Streaming)
                | (Connecting, Failed)
                | (Streaming, Ended)
                | (Streaming, Failed)
                | (Ended, Disconnected)
                | (Failed, Disconnected)
        )
    }
}

impl std::fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelayPhase::Disconnected => "disconnected",
            RelayPhase::Connecting => "connecting",
            RelayPhase::Streaming => "streaming",
            RelayPhase::Ended => "ended",
            RelayPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Complete relay state, owned by the supervisor
#[derive(Debug)]
pub struct RelayState {
    /// Current phase
    phase: RelayPhase,

    /// Id of the current or last session (0 before the first one)
    pub session_id: u64,

    /// Connect attempts since the last successful connect
    pub consecutive_failures: u32,
}

impl RelayState {
    /// Create a new state in the initial phase
    pub fn new() -> Self {
        Self {
            phase: RelayPhase::Disconnected,
            session_id: 0,
            consecutive_failures: 0,
        }
    }

    /// Current phase
    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    fn transition(&mut self, next: RelayPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal relay transition {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
    }

    /// Begin a connect attempt
    pub fn start_connect(&mut self) {
        self.transition(RelayPhase::Connecting);
    }

    /// Connect succeeded; allocates the next session id
    pub fn on_connected(&mut self) -> u64 {
        self.transition(RelayPhase::Streaming);
        self.session_id += 1;
        self.consecutive_failures = 0;
        self.session_id
    }

    /// Connect attempt failed; returns the failure streak
    pub fn on_connect_failed(&mut self) -> u32 {
        self.transition(RelayPhase::Failed);
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    /// Device closed the stream
    pub fn on_ended(&mut self) {
        self.transition(RelayPhase::Ended);
    }

    /// Stream broke mid-way
    pub fn on_stream_failed(&mut self) {
        self.transition(RelayPhase::Failed);
    }

    /// Retry delay elapsed
    pub fn reset(&mut self) {
        self.transition(RelayPhase::Disconnected);
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut state = RelayState::new();
        assert_eq!(state.phase(), RelayPhase::Disconnected);

        state.start_connect();
        assert_eq!(state.phase(), RelayPhase::Connecting);

        let id = state.on_connected();
        assert_eq!(id, 1);
        assert_eq!(state.phase(), RelayPhase::Streaming);

        state.on_ended();
        assert_eq!(state.phase(), RelayPhase::Ended);

        state.reset();
        assert_eq!(state.phase(), RelayPhase::Disconnected);
        assert_eq!(state.session_id, 1);
    }

    #[test]
    fn test_failure_streak() {
        let mut state = RelayState::new();

        for expected in 1..=3 {
            state.start_connect();
            assert_eq!(state.on_connect_failed(), expected);
            state.reset();
        }

        state.start_connect();
        let id = state.on_connected();
        assert_eq!(id, 1);
        assert_eq!(state.consecutive_failures, 0);

        state.on_stream_failed();
        assert_eq!(state.phase(), RelayPhase::Failed);
        state.reset();

        state.start_connect();
        assert_eq!(state.on_connected(), 2);
    }

    #[test]
    fn test_transition_table() {
        use RelayPhase::*;

        assert!(Disconnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Failed));
        assert!(Streaming.can_transition_to(Ended));
        assert!(Failed.can_transition_to(Disconnected));

        // No skipping the connect step or the delay
        assert!(!Disconnected.can_transition_to(Streaming));
        assert!(!Failed.can_transition_to(Connecting));
        assert!(!Ended.can_transition_to(Streaming));
        assert!(!Connecting.can_transition_to(Ended));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(RelayPhase::Streaming.to_string(), "streaming");
        assert_eq!(RelayPhase::Disconnected.to_string(), "disconnected");
    }
}
