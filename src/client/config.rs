//! Upstream client configuration

use std::time::Duration;

/// Default delay between the end of one session and the next attempt
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Upstream device configuration
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Stream URL of the device (e.g. `http://192.168.4.1:81/stream`)
    pub url: String,

    /// How long a connect attempt may take before it counts as failed
    pub connect_timeout: Duration,

    /// Fail the session when no data arrives for this long (zero = never)
    pub read_timeout: Duration,

    /// Fixed delay before reconnecting after any failure or end of stream
    pub retry_delay: Duration,

    /// User-Agent sent to the device
    pub user_agent: String,
}

impl UpstreamConfig {
    /// Create a config for the given device URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(10),
            retry_delay: DEFAULT_RETRY_DELAY,
            user_agent: concat!("mjpeg-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set read idle timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the reconnect delay
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}
