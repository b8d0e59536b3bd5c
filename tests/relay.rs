//! End-to-end tests: fake camera → relay → HTTP subscribers, over loopback.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::{Bytes, BytesMut};
use futures_util::stream;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use mjpeg_relay::client::{HttpUpstream, UpstreamConfig};
use mjpeg_relay::registry::SubscriberRegistry;
use mjpeg_relay::relay::{RelayEvent, RelayHandle, Supervisor};
use mjpeg_relay::server::{RelayServer, ServerConfig};

const RETRY_DELAY: Duration = Duration::from_millis(200);

/// One scripted response of the fake camera
struct DeviceSession {
    content_type: Option<&'static str>,
    rx: mpsc::Receiver<Bytes>,
}

/// Fake camera: serves queued sessions in order, 503 when none is queued
#[derive(Clone, Default)]
struct Device {
    sessions: Arc<Mutex<VecDeque<DeviceSession>>>,
}

impl Device {
    fn queue(&self, content_type: Option<&'static str>) -> mpsc::Sender<Bytes> {
        let (tx, rx) = mpsc::channel(16);
        self.sessions
            .lock()
            .unwrap()
            .push_back(DeviceSession { content_type, rx });
        tx
    }
}

async fn device_stream(State(device): State<Device>) -> Response {
    let next = device.sessions.lock().unwrap().pop_front();
    let Some(session) = next else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let body = Body::from_stream(stream::unfold(session.rx, |mut rx| async move {
        rx.recv().await.map(|data| (Ok::<Bytes, Infallible>(data), rx))
    }));
    let mut response = Response::new(body);
    if let Some(content_type) = session.content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.parse().unwrap());
    }
    response
}

async fn spawn_device(device: Device) -> SocketAddr {
    let app = Router::new()
        .route("/stream", get(device_stream))
        .with_state(device);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_relay(
    device_addr: SocketAddr,
) -> (SocketAddr, RelayHandle, broadcast::Receiver<RelayEvent>) {
    let config = UpstreamConfig::new(format!("http://{}/stream", device_addr))
        .connect_timeout(Duration::from_secs(2))
        .read_timeout(Duration::ZERO)
        .retry_delay(RETRY_DELAY);
    let upstream = HttpUpstream::new(config).unwrap();

    let registry = Arc::new(SubscriberRegistry::new());
    let (supervisor, handle) = Supervisor::new(upstream, registry, RETRY_DELAY);
    let events = handle.events();
    supervisor.spawn();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = RelayServer::new(ServerConfig::with_addr(addr), handle.clone());
    tokio::spawn(async move { server.serve(listener, std::future::pending()).await });

    (addr, handle, events)
}

/// Next relay event, skipping over any the receiver fell behind on
async fn next_event(events: &mut broadcast::Receiver<RelayEvent>) -> RelayEvent {
    loop {
        match events.recv().await {
            Ok(event) => return event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("relay stopped"),
        }
    }
}

async fn wait_connected(events: &mut broadcast::Receiver<RelayEvent>, session_id: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let RelayEvent::Connected { session_id: id, .. } = next_event(events).await {
                if id == session_id {
                    return;
                }
            }
        }
    })
    .await
    .expect("relay did not connect in time");
}

async fn subscribe(relay: SocketAddr) -> reqwest::Response {
    let response = reqwest::get(format!("http://{}/stream", relay))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    response
}

/// Read exactly `len` bytes off a subscriber's body
async fn read_bytes(response: &mut reqwest::Response, len: usize) -> Bytes {
    let mut buf = BytesMut::new();
    while buf.len() < len {
        let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
            .await
            .expect("no data in time")
            .unwrap()
            .expect("stream ended early");
        buf.extend_from_slice(&chunk);
    }
    assert_eq!(buf.len(), len, "received more than expected");
    buf.freeze()
}

fn content_type(response: &reqwest::Response) -> &str {
    response.headers()[header::CONTENT_TYPE.as_str()]
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_fan_out_across_reconnect() {
    let device = Device::default();
    let first = device.queue(Some("image/jpeg; boundary=xyz"));
    let device_addr = spawn_device(device.clone()).await;

    let (relay_addr, handle, mut events) = spawn_relay(device_addr).await;
    wait_connected(&mut events, 1).await;

    // S1 joins before "A"
    let mut s1 = subscribe(relay_addr).await;
    assert_eq!(content_type(&s1), "image/jpeg; boundary=xyz");
    assert_eq!(
        s1.headers()[header::CACHE_CONTROL.as_str()],
        "no-cache, no-store, must-revalidate"
    );

    first.send(Bytes::from_static(b"A")).await.unwrap();
    assert_eq!(read_bytes(&mut s1, 1).await, "A");

    // S2 joins after "A", before "B"
    let mut s2 = subscribe(relay_addr).await;
    first.send(Bytes::from_static(b"B")).await.unwrap();
    assert_eq!(read_bytes(&mut s1, 1).await, "B");
    assert_eq!(read_bytes(&mut s2, 1).await, "B");

    // Device restarts with a different boundary
    let second = device.queue(Some("multipart/x-mixed-replace; boundary=other"));
    drop(first);
    wait_connected(&mut events, 2).await;

    let mut s3 = subscribe(relay_addr).await;
    assert_eq!(
        content_type(&s3),
        "multipart/x-mixed-replace; boundary=other"
    );
    // Earlier subscribers keep the headers they started with
    assert_eq!(content_type(&s1), "image/jpeg; boundary=xyz");

    second.send(Bytes::from_static(b"C")).await.unwrap();
    for subscriber in [&mut s1, &mut s2, &mut s3] {
        assert_eq!(read_bytes(subscriber, 1).await, "C");
    }

    let stats = handle.stats().snapshot();
    assert_eq!(stats.sessions, 2);
    assert_eq!(stats.chunks_received, 3);
    assert_eq!(handle.registry().len(), 3);
}

#[tokio::test]
async fn test_unreachable_device_retried_until_available() {
    let device = Device::default();
    let device_addr = spawn_device(device.clone()).await;

    let (relay_addr, handle, mut events) = spawn_relay(device_addr).await;

    let mut failures = 0;
    let tx = loop {
        match next_event(&mut events).await {
            RelayEvent::ConnectFailed { attempt, error } => {
                failures += 1;
                assert_eq!(attempt, failures);
                assert!(error.contains("503"), "unexpected error: {}", error);
                if failures == 3 {
                    // The device comes up during the third retry delay
                    break device.queue(None);
                }
            }
            _ => continue,
        }
    };
    wait_connected(&mut events, 1).await;
    assert_eq!(handle.stats().snapshot().connect_failures, 3);

    // No content type from the device: the default framing is used
    let mut subscriber = subscribe(relay_addr).await;
    assert_eq!(
        content_type(&subscriber),
        "multipart/x-mixed-replace; boundary=frame"
    );

    tx.send(Bytes::from_static(b"--frame\r\n")).await.unwrap();
    assert_eq!(read_bytes(&mut subscriber, 9).await, "--frame\r\n");
}

#[tokio::test]
async fn test_subscriber_disconnect_leaves_others_running() {
    let device = Device::default();
    let tx = device.queue(Some("image/jpeg; boundary=xyz"));
    let device_addr = spawn_device(device).await;

    let (relay_addr, handle, mut events) = spawn_relay(device_addr).await;
    wait_connected(&mut events, 1).await;

    let mut stays = subscribe(relay_addr).await;
    let leaves = subscribe(relay_addr).await;
    assert_eq!(handle.registry().len(), 2);
    drop(leaves);

    // Keep the stream moving until the relay notices the closed socket
    let mut sent = 0;
    while handle.registry().len() > 1 && sent < 100 {
        tx.send(Bytes::from_static(b"x")).await.unwrap();
        sent += 1;
        assert_eq!(read_bytes(&mut stays, 1).await, "x");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(handle.registry().len(), 1);

    // Upstream session is untouched
    tx.send(Bytes::from_static(b"y")).await.unwrap();
    assert_eq!(read_bytes(&mut stays, 1).await, "y");
    assert_eq!(handle.stats().snapshot().sessions, 1);
}
