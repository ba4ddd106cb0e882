//! Remote URL allow-list.
//!
//! Only `https` URLs on the trusted image host (or one of its subdomains) may
//! be fetched. This check runs before any socket is opened and again on every
//! redirect hop, so the gateway cannot be turned into an open proxy.

use thiserror::Error;
use url::Url;

/// The only domain remote images may be downloaded from.
pub const TRUSTED_DOMAIN: &str = "cloudinary.com";

/// Why a remote URL was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlGuardError {
    #[error("URL is missing")]
    MissingUrl,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("disallowed scheme '{scheme}' (only https is allowed)")]
    DisallowedScheme { scheme: String },

    #[error("disallowed host '{host}' (only {} and its subdomains are allowed)", TRUSTED_DOMAIN)]
    DisallowedHost { host: String },
}

/// Trim and remove every whitespace character from a user-supplied URL.
pub fn sanitize(raw: &str) -> Result<String, UrlGuardError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(UrlGuardError::MissingUrl);
    }
    Ok(cleaned)
}

/// Sanitize, parse and allow-list check a raw URL string.
pub fn assert_allowed(raw: &str) -> Result<Url, UrlGuardError> {
    let cleaned = sanitize(raw)?;
    let url = Url::parse(&cleaned).map_err(|e| UrlGuardError::InvalidUrl {
        url: cleaned.clone(),
        reason: e.to_string(),
    })?;
    check(&url)?;
    Ok(url)
}

/// Allow-list check for an already parsed URL.
pub fn check(url: &Url) -> Result<(), UrlGuardError> {
    if url.scheme() != "https" {
        return Err(UrlGuardError::DisallowedScheme {
            scheme: url.scheme().to_string(),
        });
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if is_trusted_host(&host) {
        Ok(())
    } else {
        Err(UrlGuardError::DisallowedHost { host })
    }
}

fn is_trusted_host(host: &str) -> bool {
    host == TRUSTED_DOMAIN
        || host
            .strip_suffix(TRUSTED_DOMAIN)
            .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
}
