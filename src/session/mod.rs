//! Upstream session handling
//!
//! - `upstream`: one connection lifetime, framing plus chunk sequence
//! - `state`: the relay's connect/stream/retry state machine

pub mod state;
pub mod upstream;

pub use state::{RelayPhase, RelayState};
pub use upstream::{ChunkStream, UpstreamSession};
