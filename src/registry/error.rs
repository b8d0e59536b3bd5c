//! Registry error types
//!
//! Error types for subscriber registry operations.

use super::frame::SubscriberId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Subscriber limit reached
    Full(usize),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Full(limit) => write!(f, "Subscriber limit reached: {}", limit),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Why a chunk could not be handed to one subscriber
///
/// Either way the subscriber is removed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberWriteError {
    /// The subscriber's connection is gone
    Closed(SubscriberId),
    /// The subscriber stopped reading and its queue is full
    Lagging(SubscriberId),
}

impl SubscriberWriteError {
    /// The subscriber the failure belongs to
    pub fn subscriber(&self) -> SubscriberId {
        match self {
            SubscriberWriteError::Closed(id) | SubscriberWriteError::Lagging(id) => *id,
        }
    }
}

impl std::fmt::Display for SubscriberWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriberWriteError::Closed(id) => write!(f, "Subscriber closed: {}", id),
            SubscriberWriteError::Lagging(id) => write!(f, "Subscriber lagging: {}", id),
        }
    }
}

impl std::error::Error for SubscriberWriteError {}
