//! mjpeg-relay: fans one camera stream out to many HTTP viewers.
//!
//! Connects to the device URL, keeps reconnecting whenever the stream drops,
//! and serves `GET /stream` to any number of subscribers plus `GET /status`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use mjpeg_relay::client::{HttpUpstream, UpstreamConfig};
use mjpeg_relay::registry::{RegistryConfig, SubscriberRegistry};
use mjpeg_relay::relay::Supervisor;
use mjpeg_relay::server::{RelayServer, ServerConfig};

#[derive(Parser)]
#[command(name = "mjpeg-relay", about = "Relay one MJPEG camera stream to many HTTP clients")]
struct Args {
    /// Stream URL of the camera.
    #[arg(long, env = "RELAY_DEVICE_URL")]
    device_url: String,

    /// Address to serve subscribers on.
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Delay before reconnecting to the camera, in milliseconds.
    #[arg(long, env = "RELAY_RETRY_DELAY_MS", default_value_t = 3000)]
    retry_delay_ms: u64,

    /// Connect timeout for the camera, in milliseconds.
    #[arg(long, env = "RELAY_CONNECT_TIMEOUT_MS", default_value_t = 10_000)]
    connect_timeout_ms: u64,

    /// Reconnect when the camera sends nothing for this long (0 disables).
    #[arg(long, env = "RELAY_READ_TIMEOUT_MS", default_value_t = 10_000)]
    read_timeout_ms: u64,

    /// Chunks buffered per subscriber before it is dropped as too slow.
    #[arg(long, env = "RELAY_CHANNEL_CAPACITY", default_value_t = 64)]
    channel_capacity: usize,

    /// Maximum concurrent subscribers (0 = unlimited).
    #[arg(long, env = "RELAY_MAX_SUBSCRIBERS", default_value_t = 0)]
    max_subscribers: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mjpeg_relay=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "Relay stopped");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> mjpeg_relay::Result<()> {
    let upstream_config = UpstreamConfig::new(args.device_url)
        .connect_timeout(Duration::from_millis(args.connect_timeout_ms))
        .read_timeout(Duration::from_millis(args.read_timeout_ms))
        .retry_delay(Duration::from_millis(args.retry_delay_ms));

    let upstream = HttpUpstream::new(upstream_config)?;
    let retry_delay = upstream.config().retry_delay;
    tracing::info!(device = %upstream.config().url, "Relaying camera stream");

    let registry = Arc::new(SubscriberRegistry::with_config(
        RegistryConfig::default()
            .channel_capacity(args.channel_capacity)
            .max_subscribers(args.max_subscribers),
    ));

    let (supervisor, handle) = Supervisor::new(upstream, registry, retry_delay);
    let supervisor_task = supervisor.spawn();

    let server = RelayServer::new(ServerConfig::with_addr(args.bind), handle);
    let result = server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    supervisor_task.abort();
    result
}
