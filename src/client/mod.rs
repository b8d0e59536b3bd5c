//! Upstream client
//!
//! Provides the connection to the source device:
//! - `Upstream`: the seam the supervisor pulls sessions from
//! - `HttpUpstream`: streaming HTTP `GET` against an MJPEG device

pub mod config;
pub mod connector;

pub use config::UpstreamConfig;
pub use connector::{HttpUpstream, Upstream};
