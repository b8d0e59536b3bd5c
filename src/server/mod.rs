//! HTTP server for subscribers
//!
//! - `GET /stream`: long-lived multipart response fed by the relay
//! - `GET /status`: JSON snapshot of the relay

pub mod config;
pub mod handler;
pub mod listener;

pub use config::ServerConfig;
pub use handler::{StatusReport, SubscriberGuard};
pub use listener::RelayServer;
