//! HTTP request handlers
//!
//! `/stream` registers the caller as a subscriber and answers with a body
//! that never ends on its own. `/status` reports the relay's state.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, PRAGMA};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use futures_util::stream;
use serde::Serialize;

use crate::error::Error;
use crate::registry::{ContentFraming, SubscriberId, SubscriberRegistry, DEFAULT_MIME_TYPE};
use crate::relay::RelayHandle;
use crate::session::RelayPhase;
use crate::stats::RelayStatsSnapshot;

/// Removes a subscriber from the registry when its response body is dropped
///
/// Hyper drops the body as soon as the client connection goes away.
pub struct SubscriberGuard {
    id: SubscriberId,
    registry: Arc<SubscriberRegistry>,
}

impl SubscriberGuard {
    pub fn new(id: SubscriberId, registry: Arc<SubscriberRegistry>) -> Self {
        Self { id, registry }
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        // Already gone if a broadcast dropped it first
        if let Some(stats) = self.registry.subscriber_stats(self.id) {
            self.registry.remove(self.id);
            tracing::debug!(
                subscriber_id = %self.id,
                delivered = stats.delivered,
                connected_ms = stats.connected_for.as_millis() as u64,
                "Subscriber disconnected"
            );
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Registry(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

fn framing_header(framing: &ContentFraming) -> HeaderValue {
    HeaderValue::from_str(framing.as_str()).unwrap_or_else(|_| {
        // Came from a header, so only a hand-built descriptor can get here
        tracing::warn!(framing = %framing, "Framing is not a valid header value");
        HeaderValue::from_str(ContentFraming::default().as_str())
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_MIME_TYPE))
    })
}

/// GET /stream
pub(super) async fn stream_handler(
    State(relay): State<RelayHandle>,
) -> Result<Response, Error> {
    // Fixed for the lifetime of this response
    let framing = relay.framing();

    let (id, rx) = relay.registry().add().map_err(|e| {
        tracing::warn!(error = %e, "Subscriber rejected");
        Error::from(e)
    })?;
    relay.stats().record_subscriber();

    tracing::info!(
        subscriber_id = %id,
        framing = %framing,
        subscribers = relay.registry().len(),
        "Subscriber connected"
    );

    let guard = SubscriberGuard::new(id, Arc::clone(relay.registry()));
    let chunks = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv()
            .await
            .map(|chunk| (Ok::<Bytes, Infallible>(chunk.data), (rx, guard)))
    });

    let mut response = Response::new(Body::from_stream(chunks));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, framing_header(&framing));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(response)
}

/// Body of GET /status
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub phase: RelayPhase,
    pub framing: String,
    pub subscribers: usize,
    /// Average upstream bitrate since start, bits per second
    pub bitrate: u64,
    pub stats: RelayStatsSnapshot,
}

/// GET /status
pub(super) async fn status_handler(State(relay): State<RelayHandle>) -> Json<StatusReport> {
    let stats = relay.stats().snapshot();
    Json(StatusReport {
        phase: relay.phase(),
        framing: relay.framing().to_string(),
        subscribers: relay.registry().len(),
        bitrate: stats.bitrate(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;

    #[test]
    fn test_guard_removes_subscriber() {
        let registry = Arc::new(SubscriberRegistry::new());
        let (id, _rx) = registry.add().unwrap();

        let guard = SubscriberGuard::new(id, Arc::clone(&registry));
        assert!(registry.contains(id));

        drop(guard);
        assert!(!registry.contains(id));
    }

    #[test]
    fn test_framing_header_verbatim() {
        let value = framing_header(&ContentFraming::new("image/jpeg; boundary=xyz"));
        assert_eq!(value, "image/jpeg; boundary=xyz");
    }

    #[test]
    fn test_framing_header_invalid_falls_back() {
        let value = framing_header(&ContentFraming::new("bad\nvalue"));
        assert_eq!(value, ContentFraming::default().as_str());
        assert_eq!(value, "multipart/x-mixed-replace; boundary=frame");
    }

    #[test]
    fn test_registry_full_maps_to_unavailable() {
        let response = Error::from(RegistryError::Full(2)).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = Error::Config("bad url".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
