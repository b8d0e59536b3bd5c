//! Chunk and framing types for stream routing
//!
//! This module defines the units that flow from the upstream device to
//! subscribers, and the descriptor that tells subscribers how to split them.

use bytes::Bytes;

/// Default MIME type when the device does not declare one
pub const DEFAULT_MIME_TYPE: &str = "multipart/x-mixed-replace";

/// Default multipart boundary token
pub const DEFAULT_BOUNDARY: &str = "frame";

/// Unique identifier for a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Content-Type descriptor learned from the upstream device
///
/// Kept verbatim: whatever the device declared is what subscribers get in
/// their response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFraming(String);

impl ContentFraming {
    /// Create a descriptor from a raw Content-Type value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw descriptor string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type portion (everything before the first `;`)
    pub fn mime_type(&self) -> &str {
        self.0.split(';').next().unwrap_or_default().trim()
    }

    /// Multipart boundary token, if declared
    ///
    /// Surrounding quotes are stripped; parameter names are matched
    /// case-insensitively.
    pub fn boundary(&self) -> Option<&str> {
        self.0.split(';').skip(1).find_map(|param| {
            let (name, value) = param.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("boundary") {
                Some(value.trim().trim_matches('"'))
            } else {
                None
            }
        })
    }
}

impl Default for ContentFraming {
    fn default() -> Self {
        Self(format!("{}; boundary={}", DEFAULT_MIME_TYPE, DEFAULT_BOUNDARY))
    }
}

impl std::fmt::Display for ContentFraming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One upstream read event, forwarded untouched
///
/// This is designed to be cheap to clone due to `Bytes` reference counting.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Upstream session the chunk came from
    pub session_id: u64,
    /// Position within the session, starting at 0
    pub sequence: u64,
    /// Raw bytes (zero-copy via reference counting)
    pub data: Bytes,
}

impl Chunk {
    /// Create a chunk
    pub fn new(session_id: u64, sequence: u64, data: Bytes) -> Self {
        Self {
            session_id,
            sequence,
            data,
        }
    }

    /// Size of the payload in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
