//! Upstream-to-subscriber relay
//!
//! ```text
//!   device ──HTTP──► Upstream::connect() ──► UpstreamSession
//!                                                 │
//!                       Supervisor (own task) ◄───┘
//!                            │  pump()
//!                            ▼
//!                       Broadcaster ──► SubscriberRegistry ──► /stream bodies
//! ```
//!
//! The supervisor is the only writer of the framing descriptor and the
//! lifecycle phase; the HTTP side reads them through a [`RelayHandle`].

pub mod broadcaster;
pub mod handle;
pub mod supervisor;

pub use broadcaster::{Broadcaster, SessionOutcome};
pub use handle::{RelayEvent, RelayHandle};
pub use supervisor::Supervisor;
