//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use axum::{
    http::{header, StatusCode, Uri},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use verify_gateway::config::GatewayConfig;
use verify_gateway::http::HttpServer;
use verify_gateway::image::fetch;
use verify_gateway::lifecycle::Shutdown;

/// Host remote-fetch tests pin to a local socket.
pub const IMAGE_HOST: &str = "res.cloudinary.com";

const TEST_CERT: &[u8] = include_bytes!("../fixtures/tls/cert.pem");
const TEST_KEY: &[u8] = include_bytes!("../fixtures/tls/key.pem");

/// URL on the pinned image host. The port has to be explicit because a
/// pinned resolution only replaces the address, not the port.
pub fn image_url(host: SocketAddr, path: &str) -> String {
    format!("https://{}:{}{}", IMAGE_HOST, host.port(), path)
}

/// A fake verification engine that records every request it receives.
pub struct MockUpstream {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockUpstream {
    /// Requests seen so far as (path, JSON body).
    pub fn received(&self) -> Vec<(String, Value)> {
        self.received.lock().unwrap().clone()
    }
}

/// Start a mock engine answering every POST with a fixed status and body.
pub async fn start_mock_upstream(status: u16, body: &'static str) -> MockUpstream {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    let app = Router::new().fallback(move |uri: Uri, Json(payload): Json<Value>| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push((uri.path().to_string(), payload));
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, received }
}

/// An HTTPS image host serving one fixed body for every path.
pub struct ImageHost {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl ImageHost {
    pub fn url(&self, path: &str) -> String {
        image_url(self.addr, path)
    }

    /// Requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start an HTTPS image host using the self-signed `res.cloudinary.com` cert.
pub async fn start_image_host(body: &'static [u8]) -> ImageHost {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().fallback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { ([(header::CONTENT_TYPE, "image/png")], body) }
    });

    let tls = RustlsConfig::from_pem(TEST_CERT.to_vec(), TEST_KEY.to_vec()).await.unwrap();
    let handle = axum_server::Handle::new();
    let server = axum_server::bind_rustls(SocketAddr::from(([127, 0, 0, 1], 0)), tls)
        .handle(handle.clone());
    tokio::spawn(server.serve(app.into_make_service()));
    let addr = handle.listening().await.unwrap();

    ImageHost { addr, hits }
}

/// A server that accepts connections and never answers.
pub struct StalledServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    closed: mpsc::UnboundedReceiver<()>,
}

impl StalledServer {
    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait until a client has hung up on one of the held connections.
    pub async fn wait_closed(&mut self) -> Option<()> {
        self.closed.recv().await
    }
}

/// Start a server that holds every connection open and reports when the
/// client side goes away.
pub async fn start_stalled_server() -> StalledServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let (closed_tx, closed) = mpsc::unbounded_channel();

    let counter = accepted.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let closed_tx = closed_tx.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) => continue,
                            }
                        }
                        let _ = closed_tx.send(());
                    });
                }
                Err(_) => break,
            }
        }
    });

    StalledServer { addr, accepted, closed }
}

/// Config pointing at `upstream` with short test timeouts.
pub fn gateway_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = format!("http://{}", upstream);
    config.upstream.timeout_ms = 2_000;
    config.remote.download_timeout_ms = 2_000;
    config
}

/// Remote-image client whose trusted host resolves to `target` and which
/// accepts the test certificate.
pub fn pinned_remote_client(target: SocketAddr) -> reqwest::Client {
    fetch::client_builder()
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .resolve(IMAGE_HOST, target)
        .build()
        .unwrap()
}

/// Start the gateway on an ephemeral port.
pub async fn spawn_gateway(
    config: GatewayConfig,
    remote_client: reqwest::Client,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let upstream_client = reqwest::Client::builder().no_proxy().build().unwrap();
    let server = HttpServer::with_clients(config, remote_client, upstream_client);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Plain client for talking to the gateway.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
