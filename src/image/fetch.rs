//! Remote image download.
//!
//! # Responsibilities
//! - Allow-list the URL before any I/O (see [`guard`](crate::image::guard))
//! - GET the image under a deadline, following allow-listed redirects only
//! - Return the body base64-encoded
//!
//! # Design Decisions
//! - No size cap on the downloaded body; the trusted host and the inbound
//!   body limit are the only ceilings
//! - One attempt per call; the whole GET (headers and body) shares one deadline

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::redirect;
use std::time::Instant;
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{error_chain, snippet, GatewayError, GatewayResult};
use crate::image::guard;
use crate::observability::metrics;
use crate::resilience::Deadline;

/// User agent sent with every remote image request.
pub const FETCH_USER_AGENT: &str =
    concat!("verify-gateway/", env!("CARGO_PKG_VERSION"), " (image-fetch)");

const MAX_REDIRECTS: usize = 5;

/// Client builder preconfigured for remote image downloads.
///
/// Redirects are followed only while every hop stays on the allow-list.
pub fn client_builder() -> reqwest::ClientBuilder {
    let policy = redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match guard::check(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(e) => attempt.error(e),
        }
    });

    reqwest::Client::builder().redirect(policy)
}

/// Downloads allow-listed images and hands them back as base64.
#[derive(Clone)]
pub struct RemoteImageFetcher {
    client: reqwest::Client,
    deadline: Deadline,
}

impl RemoteImageFetcher {
    pub fn new(client: reqwest::Client, config: &RemoteConfig) -> Self {
        Self {
            client,
            deadline: Deadline::from_millis(config.download_timeout_ms),
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.deadline.as_millis()
    }

    /// Validate `raw_url` and download it. `label` names the slot in errors.
    pub async fn fetch(&self, raw_url: &str, label: &str) -> GatewayResult<String> {
        let url = guard::assert_allowed(raw_url).map_err(|source| {
            metrics::record_fetch("rejected");
            GatewayError::RemoteUrl {
                label: label.to_string(),
                source,
            }
        })?;

        let result = self.download(url, label).await;
        metrics::record_fetch(match &result {
            Ok(_) => "ok",
            Err(GatewayError::Timeout { .. }) => "timeout",
            Err(_) => "error",
        });
        result
    }

    /// Download without the allow-list check. Callers must have validated `url`.
    async fn download(&self, url: Url, label: &str) -> GatewayResult<String> {
        let started = Instant::now();
        tracing::debug!(label = %label, url = %url, "Downloading remote image");

        let request = self
            .client
            .get(url.clone())
            .header(USER_AGENT, FETCH_USER_AGENT)
            .header(ACCEPT, "image/*");

        let outcome = self
            .deadline
            .run(async {
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Ok(Err((status.as_u16(), body)));
                }
                let bytes = response.bytes().await?;
                Ok::<_, reqwest::Error>(Ok(bytes))
            })
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Err(_) => {
                tracing::warn!(
                    label = %label,
                    url = %url,
                    elapsed_ms,
                    "Remote image download timed out"
                );
                Err(GatewayError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.deadline.as_millis(),
                })
            }
            Ok(Err(e)) => {
                let cause = error_chain(&e);
                tracing::warn!(
                    label = %label,
                    url = %url,
                    error = %cause,
                    "Remote image download failed"
                );
                Err(GatewayError::DownloadFailed {
                    url: url.to_string(),
                    cause,
                })
            }
            Ok(Ok(Err((status, body)))) => {
                tracing::warn!(
                    label = %label,
                    url = %url,
                    status,
                    "Remote image host returned an error"
                );
                Err(GatewayError::UpstreamHttpError {
                    status,
                    label: label.to_string(),
                    snippet: snippet(&body),
                })
            }
            Ok(Ok(Ok(bytes))) => {
                tracing::debug!(
                    label = %label,
                    bytes = bytes.len(),
                    elapsed_ms,
                    "Remote image downloaded"
                );
                Ok(STANDARD.encode(&bytes))
            }
        }
    }
}
