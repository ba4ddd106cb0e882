//! Upstream verification engine client.
//!
//! # Responsibilities
//! - POST a JSON payload to one engine endpoint under a deadline
//! - Read the body regardless of status and parse it if it is JSON
//! - Translate timeouts and transport failures into gateway errors
//!
//! # Design Decisions
//! - A non-2xx answer is not a failure here; the handler relays it verbatim
//! - Non-JSON bodies are wrapped as `{ "raw": <text> }`
//! - Exactly one attempt per call

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Instant;

use crate::config::UpstreamConfig;
use crate::error::{error_chain, GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::resilience::Deadline;

/// Status and body exactly as the engine returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    /// Parse `text` as JSON, falling back to `{ "raw": text }`.
    pub fn from_text(status: u16, text: String) -> Self {
        let body =
            serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "raw": text }));
        Self { status, body }
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(self.body)).into_response()
    }
}

/// Sends normalized payloads to the upstream engine.
#[derive(Clone)]
pub struct UpstreamDispatcher {
    client: reqwest::Client,
    config: UpstreamConfig,
    deadline: Deadline,
}

impl UpstreamDispatcher {
    pub fn new(client: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            config: config.clone(),
            deadline: Deadline::from_millis(config.timeout_ms),
        }
    }

    /// Full URL of an engine path such as `/verify-cnic`.
    pub fn endpoint(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.deadline.as_millis()
    }

    /// POST `payload` to `endpoint` and return whatever came back.
    pub async fn dispatch(
        &self,
        endpoint: &str,
        payload: &Value,
    ) -> GatewayResult<UpstreamResponse> {
        let started = Instant::now();
        tracing::debug!(endpoint = %endpoint, "Dispatching to upstream");

        let request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(payload);

        let outcome = self
            .deadline
            .run(async {
                let response = request.send().await?;
                let status = response.status().as_u16();
                let text = response.text().await?;
                Ok::<_, reqwest::Error>((status, text))
            })
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(Ok((status, text))) => {
                tracing::info!(endpoint = %endpoint, status, elapsed_ms, "Upstream responded");
                metrics::record_dispatch("ok");
                Ok(UpstreamResponse::from_text(status, text))
            }
            Ok(Err(e)) => {
                let cause = error_chain(&e);
                tracing::error!(
                    endpoint = %endpoint,
                    error = %cause,
                    elapsed_ms,
                    "Upstream unreachable"
                );
                metrics::record_dispatch("unreachable");
                Err(GatewayError::UpstreamUnreachable {
                    endpoint: endpoint.to_string(),
                    cause,
                })
            }
            Err(expired) => {
                tracing::error!(
                    endpoint = %endpoint,
                    timeout_ms = expired.limit_ms,
                    "Upstream timed out"
                );
                metrics::record_dispatch("timeout");
                Err(GatewayError::UpstreamTimeout {
                    endpoint: endpoint.to_string(),
                    timeout_ms: expired.limit_ms,
                })
            }
        }
    }
}
