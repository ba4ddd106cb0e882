//! Liveness and diagnostic endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::server::AppState;
use crate::image::TRUSTED_DOMAIN;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// Effective, non-secret configuration echoed by `/version`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub upstream_base_url: String,
    pub remote_download_timeout_ms: u64,
    pub upstream_timeout_ms: u64,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub trusted_image_domain: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

/// GET /version
pub async fn version(State(state): State<AppState>) -> Json<VersionInfo> {
    let config = &state.config;
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        upstream_base_url: config.upstream.base_url.clone(),
        remote_download_timeout_ms: state.fetcher.timeout_ms(),
        upstream_timeout_ms: state.dispatcher.timeout_ms(),
        port: config.listener.port,
        body_limit_bytes: config.http.body_limit_bytes,
        trusted_image_domain: TRUSTED_DOMAIN,
    })
}
