//! Identity-verification gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                 VERIFY GATEWAY                   │
//!                       │                                                  │
//!   Client Request      │  ┌─────────┐    ┌──────────┐    ┌────────────┐  │
//!   ────────────────────┼─▶│  http   │───▶│  image   │───▶│  upstream  │──┼──▶ Verification
//!                       │  │handlers │    │  slots   │    │  dispatch  │  │    Engine
//!                       │  └─────────┘    └────┬─────┘    └─────┬──────┘  │
//!                       │                      │ URL only        │         │
//!                       │                      ▼                 │         │
//!                       │               ┌─────────────┐          │         │
//!                       │               │ guard+fetch │──────────┼─────────┼──▶ Image Host
//!                       │               └─────────────┘          │         │    (allow-listed)
//!   Client Response     │                                        │         │
//!   ◀───────────────────┼──────────── status + body relayed ◀────┘         │
//!                       │                                                  │
//!                       │  Cross-cutting: config, observability,           │
//!                       │  resilience (deadlines), lifecycle               │
//!                       └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use verify_gateway::config::load_config;
use verify_gateway::http::HttpServer;
use verify_gateway::lifecycle::{signals, Shutdown};
use verify_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "verify-gateway")]
#[command(about = "HTTP gateway in front of the identity verification engine", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Missing UPSTREAM_BASE_URL fails here, before anything binds.
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "verify-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        upstream = %config.upstream.base_url,
        remote_download_timeout_ms = config.remote.download_timeout_ms,
        upstream_timeout_ms = config.upstream.timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
