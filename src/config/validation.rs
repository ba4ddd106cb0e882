//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require the upstream base URL and check it parses as http(s)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream base URL is required (set UPSTREAM_BASE_URL)")]
    MissingUpstream,

    #[error("upstream base URL '{0}' is not a valid http(s) URL")]
    InvalidUpstream(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("CORS origin '{0}' is not a valid header value")]
    InvalidCorsOrigin(String),

    #[error("metrics address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration for semantic problems.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base_url = config.upstream.base_url.trim();
    if base_url.is_empty() {
        errors.push(ValidationError::MissingUpstream);
    } else {
        match Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => errors.push(ValidationError::InvalidUpstream(base_url.to_string())),
        }
    }

    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue("upstream.timeout_ms"));
    }
    if config.remote.download_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue("remote.download_timeout_ms"));
    }
    if config.http.body_limit_bytes == 0 {
        errors.push(ValidationError::ZeroValue("http.body_limit_bytes"));
    }

    let origin = config.http.cors_allow_origin.trim();
    if origin != "*" && HeaderValue::from_str(origin).is_err() {
        errors.push(ValidationError::InvalidCorsOrigin(origin.to_string()));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
