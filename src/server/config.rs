//! Server configuration

use std::net::SocketAddr;

/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Path of the subscription endpoint
    pub stream_path: String,

    /// Path of the status endpoint
    pub status_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            stream_path: "/stream".to_string(),
            status_path: "/status".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the subscription endpoint path
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = normalize_path(path.into());
        self
    }

    /// Set the status endpoint path
    pub fn status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = normalize_path(path.into());
        self
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.stream_path, "/stream");
        assert_eq!(config.status_path, "/status");
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 8081);
    }

    #[test]
    fn test_paths_get_leading_slash() {
        let config = ServerConfig::default()
            .stream_path("video")
            .status_path("/health");

        assert_eq!(config.stream_path, "/video");
        assert_eq!(config.status_path, "/health");
    }
}
