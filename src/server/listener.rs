//! Relay HTTP server
//!
//! Binds the listener and serves the subscription and status endpoints.
//! Accepting a subscriber never waits on the upstream side.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::relay::RelayHandle;
use crate::server::config::ServerConfig;
use crate::server::handler::{status_handler, stream_handler};

/// Relay server
pub struct RelayServer {
    config: ServerConfig,
    handle: RelayHandle,
}

impl RelayServer {
    /// Create a new server in front of a running relay
    pub fn new(config: ServerConfig, handle: RelayHandle) -> Self {
        Self { config, handle }
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.stream_path, get(stream_handler))
            .route(&self.config.status_path, get(status_handler))
            .with_state(self.handle.clone())
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.bind_addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    ///
    /// Subscriber responses never finish on their own, so shutdown stops
    /// accepting instead of waiting for open connections to drain.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            addr = %listener.local_addr()?,
            stream_path = %self.config.stream_path,
            "Relay server listening"
        );

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = axum::serve(listener, self.router()).into_future() => {
                result?;
                Ok(())
            }
        }
    }
}
