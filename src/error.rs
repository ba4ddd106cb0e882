//! Gateway error taxonomy.
//!
//! Every failure raised by the image pipeline or the upstream dispatcher is a
//! [`GatewayError`]. Handlers return it directly; the [`IntoResponse`] impl
//! turns it into the fixed `{ "error": <message> }` body.
//!
//! # Status mapping
//! - `MissingImage`, `BadRequest` → 400
//! - `PayloadTooLarge` → 413
//! - everything else → 500

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::image::guard::UrlGuardError;

/// Maximum number of characters of a failed download body kept in the error.
pub const BODY_SNIPPET_CHARS: usize = 200;

/// Errors produced while resolving images or talking to the upstream engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A remote image URL was rejected by the allow-list before any I/O.
    #[error("Rejected {label} URL: {source}")]
    RemoteUrl {
        label: String,
        #[source]
        source: UrlGuardError,
    },

    /// The remote image download did not finish in time.
    #[error("Timed out downloading image from {url} after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Transport-level failure while downloading a remote image.
    #[error("Failed to download image from {url}: {cause}")]
    DownloadFailed { url: String, cause: String },

    /// The remote image host answered with a non-success status.
    #[error("Failed to download {label}: HTTP {status} {snippet}")]
    UpstreamHttpError {
        status: u16,
        label: String,
        snippet: String,
    },

    /// The upstream engine did not answer in time.
    #[error("Upstream request to {endpoint} timed out after {timeout_ms}ms")]
    UpstreamTimeout { endpoint: String, timeout_ms: u64 },

    /// The upstream engine could not be reached at all.
    #[error("Upstream {endpoint} unreachable: {cause}")]
    UpstreamUnreachable { endpoint: String, cause: String },

    /// A required image slot resolved to nothing.
    #[error("{0}")]
    MissingImage(String),

    /// The request body was not something the gateway can read.
    #[error("{0}")]
    BadRequest(String),

    /// The request body exceeded the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The whole request outlived the gateway's overall ceiling.
    #[error("Request exceeded the {timeout_ms}ms gateway time limit")]
    RequestTimeout { timeout_ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// HTTP status surfaced to the caller for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingImage(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Rejected request");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Flatten an error and its `source()` chain into one line.
///
/// reqwest's top-level `Display` hides the interesting part ("connection
/// refused", "dns error") in the source chain.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        current = cause.source();
    }
    message
}

/// Truncate a response body for inclusion in an error message.
pub fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
