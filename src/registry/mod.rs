//! Subscriber registry for chunk fan-out
//!
//! The registry holds one bounded channel per connected subscriber. The
//! broadcaster pushes every upstream chunk into each channel; the HTTP
//! response body of each subscriber drains its own channel.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<SubscriberRegistry>
//!                    ┌──────────────────────────┐
//!                    │ subscribers: HashMap<Id, │
//!                    │   SubscriberEntry {      │
//!                    │     tx: mpsc::Sender,    │
//!                    │   }                      │
//!                    │ >                        │
//!                    └────────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Broadcaster]           [Subscriber]            [Subscriber]
//!    session.next()          rx.recv()               rx.recv()
//!         │                       │                       │
//!         └──► registry.broadcast() ──► response body ──► TCP
//! ```
//!
//! # Zero-Copy Design
//!
//! `bytes::Bytes` uses reference counting, so all subscribers share the same
//! memory allocation. Each channel receives a clone of the `Chunk`, but the
//! inner `Bytes` data is only reference-counted, not copied.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{SubscriberEntry, SubscriberStats};
pub use error::{RegistryError, SubscriberWriteError};
pub use frame::{Chunk, ContentFraming, SubscriberId, DEFAULT_BOUNDARY, DEFAULT_MIME_TYPE};
pub use store::{BroadcastReport, SubscriberRegistry};
