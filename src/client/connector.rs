//! Upstream connector
//!
//! Opens the single streaming connection to the source device.

use std::future::Future;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::error::{ConnectError, Error, Result};
use crate::registry::ContentFraming;
use crate::session::UpstreamSession;

use super::config::UpstreamConfig;

/// Source of upstream sessions
///
/// Each call opens a fresh session. A failed call is retried by the
/// supervisor after its fixed delay.
pub trait Upstream: Send + Sync + 'static {
    /// Open a new session
    fn connect(&self) -> impl Future<Output = Result<UpstreamSession>> + Send;
}

/// HTTP connector for MJPEG devices
///
/// Issues a streaming `GET` to the device URL and exposes the response
/// body as the session's chunk sequence.
pub struct HttpUpstream {
    config: UpstreamConfig,
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Create a connector for the configured device
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the connector configuration
    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    async fn open(&self) -> std::result::Result<reqwest::Response, ConnectError> {
        let request = self.client.get(&self.config.url).send();

        // Covers the wait for response headers, not just the TCP connect
        let response = if self.config.connect_timeout.is_zero() {
            request.await
        } else {
            tokio::time::timeout(self.config.connect_timeout, request)
                .await
                .map_err(|_| ConnectError::Timeout(self.config.connect_timeout))?
        }
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectError::Status(status.as_u16()));
        }

        Ok(response)
    }
}

impl Upstream for HttpUpstream {
    async fn connect(&self) -> Result<UpstreamSession> {
        let response = self.open().await?;

        let framing = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ContentFraming::new);

        tracing::debug!(
            url = %self.config.url,
            status = response.status().as_u16(),
            framing = ?framing,
            "Upstream responded"
        );

        let chunks = response
            .bytes_stream()
            .map(|item| item.map_err(|e| Error::StreamRead(e.to_string())));

        Ok(UpstreamSession::new(framing, chunks).with_read_timeout(self.config.read_timeout))
    }
}
