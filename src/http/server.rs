//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the outbound clients and the shared application state
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS)
//! - Keep the `{ "error": <message> }` body when the overall ceiling fires
//! - Serve until the shutdown signal fires

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, HttpConfig};
use crate::error::{error_chain, GatewayError, GatewayResult};
use crate::http::handlers::{face_verify, shop_verify, verify_cnic};
use crate::http::request::{make_span, UuidRequestId, X_REQUEST_ID};
use crate::http::status::{health, version};
use crate::image::{fetch, RemoteImageFetcher};
use crate::upstream::{UpstreamDispatcher, UpstreamResponse};

/// Application state injected into handlers.
///
/// Holds no per-request data; every request works on its own local values.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: RemoteImageFetcher,
    pub dispatcher: UpstreamDispatcher,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Dispatch a finished payload to an engine path.
    pub async fn forward(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> GatewayResult<UpstreamResponse> {
        let endpoint = self.dispatcher.endpoint(path);
        self.dispatcher.dispatch(&endpoint, &payload).await
    }
}

/// HTTP server for the verification gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with default outbound clients.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let remote_client = fetch::client_builder()
            .build()
            .map_err(|e| GatewayError::Internal(error_chain(&e)))?;
        let upstream_client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Internal(error_chain(&e)))?;
        Ok(Self::with_clients(config, remote_client, upstream_client))
    }

    /// Create a server around caller-built clients.
    ///
    /// The remote client should come from [`fetch::client_builder`] so the
    /// redirect allow-list stays in place.
    pub fn with_clients(
        config: GatewayConfig,
        remote_client: reqwest::Client,
        upstream_client: reqwest::Client,
    ) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            fetcher: RemoteImageFetcher::new(remote_client, &config.remote),
            dispatcher: UpstreamDispatcher::new(upstream_client, &config.upstream),
            config: config.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let ceiling_ms = config.request_timeout_ms();

        Router::new()
            .route("/verify-cnic", post(verify_cnic))
            .route("/face-verify", post(face_verify))
            .route("/shop-verify", post(shop_verify))
            .route("/health", get(health))
            .route("/version", get(version))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.http.body_limit_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                        ceiling_error(err, ceiling_ms).into_response()
                    }))
                    .layer(TimeoutLayer::new(Duration::from_millis(ceiling_ms))),
            )
            .layer(cors_layer(&config.http))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Map a failure from the overall request ceiling into the JSON error body.
fn ceiling_error(err: BoxError, ceiling_ms: u64) -> GatewayError {
    if err.is::<Elapsed>() {
        GatewayError::RequestTimeout {
            timeout_ms: ceiling_ms,
        }
    } else {
        GatewayError::Internal(err.to_string())
    }
}

fn cors_layer(config: &HttpConfig) -> CorsLayer {
    let origin = config.cors_allow_origin.trim();
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, X_REQUEST_ID]);

    match HeaderValue::from_str(origin) {
        Ok(value) if origin != "*" => layer.allow_origin(value),
        _ => layer.allow_origin(Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "http://127.0.0.1:9".into();
        HttpServer::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_missing_cnic_image_in_process() {
        let req = Request::builder()
            .method("POST")
            .uri("/verify-cnic")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"image":"   ","imageUrl":""}"#))
            .unwrap();

        let resp = server().router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().contains_key("x-request-id"));

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Missing CNIC image"));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/face-verify")
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let resp = server().router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_ceiling_timeout_keeps_error_body() {
        let resp = ceiling_error(Box::new(Elapsed::new()), 12_000).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Request exceeded the 12000ms gateway time limit");

        let other = ceiling_error("worker gone".into(), 12_000);
        assert!(matches!(other, GatewayError::Internal(_)));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let req = Request::builder().uri("/admin").body(Body::empty()).unwrap();
        let resp = server().router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
