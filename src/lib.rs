//! mjpeg-relay: one camera connection, many viewers
//!
//! Opens a single streaming HTTP connection to a device that emits a
//! multipart byte stream (typically MJPEG) and forwards every chunk,
//! untouched, to any number of HTTP subscribers.
//!
//! - The upstream connection is retried forever with a fixed delay.
//! - A subscriber that disconnects or stops reading is dropped without
//!   affecting anybody else.
//! - Subscribers only receive chunks that arrive after they joined.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use mjpeg_relay::client::{HttpUpstream, UpstreamConfig};
//! use mjpeg_relay::registry::SubscriberRegistry;
//! use mjpeg_relay::relay::Supervisor;
//! use mjpeg_relay::server::{RelayServer, ServerConfig};
//!
//! # async fn example() -> mjpeg_relay::Result<()> {
//! let upstream = HttpUpstream::new(UpstreamConfig::new("http://192.168.4.1:81/stream"))?;
//! let retry_delay = upstream.config().retry_delay;
//!
//! let registry = Arc::new(SubscriberRegistry::new());
//! let (supervisor, handle) = Supervisor::new(upstream, registry, retry_delay);
//! supervisor.spawn();
//!
//! RelayServer::new(ServerConfig::default(), handle).run().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use client::{HttpUpstream, Upstream, UpstreamConfig};
pub use error::{ConnectError, Error, Result};
pub use registry::{Chunk, ContentFraming, RegistryConfig, SubscriberRegistry};
pub use relay::{RelayEvent, RelayHandle, Supervisor};
pub use server::{RelayServer, ServerConfig};
pub use session::{RelayPhase, UpstreamSession};
