//! Error types for the relay
//!
//! Every failure in the relay is contained where it happens: upstream
//! errors end the current session and schedule a reconnect, subscriber
//! errors drop that one subscriber. Nothing here is meant to take the
//! process down.

use std::fmt;
use std::time::Duration;

use crate::registry::RegistryError;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Upstream device could not be reached or refused the stream
    Connect(ConnectError),
    /// Upstream connection dropped or stalled mid-stream
    StreamRead(String),
    /// Subscriber registry rejected an operation
    Registry(RegistryError),
    /// I/O error (binding the listener, serving)
    Io(std::io::Error),
    /// Invalid configuration
    Config(String),
}

/// Reasons an upstream connection attempt fails
#[derive(Debug)]
pub enum ConnectError {
    /// Transport-level failure (DNS, refused, reset, TLS)
    Transport(String),
    /// The device did not answer within the connect timeout
    Timeout(Duration),
    /// The device answered with a non-success status
    Status(u16),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connect(e) => write!(f, "Upstream connect error: {}", e),
            Error::StreamRead(msg) => write!(f, "Upstream read error: {}", msg),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Transport(msg) => write!(f, "{}", msg),
            ConnectError::Timeout(after) => write!(f, "timed out after {:?}", after),
            ConnectError::Status(code) => write!(f, "device answered with status {}", code),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Registry(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ConnectError> for Error {
    fn from(e: ConnectError) -> Self {
        Error::Connect(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::Connect(ConnectError::Status(503));
        assert_eq!(
            err.to_string(),
            "Upstream connect error: device answered with status 503"
        );

        let err = Error::StreamRead("connection reset".into());
        assert_eq!(err.to_string(), "Upstream read error: connection reset");
    }

    #[test]
    fn test_from_conversions() {
        let err = Error::from(ConnectError::Timeout(Duration::from_secs(1)));
        assert_eq!(err.to_string(), "Upstream connect error: timed out after 1s");

        let err = Error::from(RegistryError::Full(4));
        assert!(matches!(err, Error::Registry(RegistryError::Full(4))));
        assert!(std::error::Error::source(&err).is_some());
    }
}
