//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file (if given), apply environment overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-style settings on top of `config`.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("UPSTREAM_BASE_URL").or_else(|| get("VERIFY_ENGINE_URL")) {
        config.upstream.base_url = url.trim().to_string();
    }
    if let Some(v) = get("UPSTREAM_TIMEOUT_MS") {
        config.upstream.timeout_ms = parse_var("UPSTREAM_TIMEOUT_MS", &v)?;
    }
    if let Some(v) = get("REMOTE_DOWNLOAD_TIMEOUT_MS") {
        config.remote.download_timeout_ms = parse_var("REMOTE_DOWNLOAD_TIMEOUT_MS", &v)?;
    }
    if let Some(v) = get("PORT") {
        config.listener.port = parse_var("PORT", &v)?;
    }
    if let Some(v) = get("HOST") {
        config.listener.host = v.trim().to_string();
    }
    if let Some(v) = get("BODY_LIMIT_BYTES") {
        config.http.body_limit_bytes = parse_var("BODY_LIMIT_BYTES", &v)?;
    }
    if let Some(v) = get("CORS_ALLOW_ORIGIN") {
        config.http.cors_allow_origin = v.trim().to_string();
    }
    if let Some(v) = get("LOG_LEVEL") {
        config.observability.log_level = v.trim().to_string();
    }
    if let Some(v) = get("LOG_FORMAT") {
        config.observability.log_format = match v.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            _ => return Err(ConfigError::Env { var: "LOG_FORMAT", value: v }),
        };
    }
    if let Some(v) = get("METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_var("METRICS_ENABLED", &v)?;
    }
    if let Some(v) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = v.trim().to_string();
    }

    Ok(())
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}
