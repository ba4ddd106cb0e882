//! Base64 normalization for inline image fields.
//!
//! Callers send images either as bare base64 or as a data URI
//! (`data:image/png;base64,....`). Both collapse to the bare payload here.
//! The payload is not decoded or validated; malformed base64 is the upstream
//! engine's problem to report.

/// Prefix of the data-URI sibling field sent to the upstream engine.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Strip an optional data-URI prefix and surrounding whitespace.
///
/// Returns `None` for absent, empty or whitespace-only input so that callers
/// can fall back to a remote URL.
pub fn normalize(input: Option<&str>) -> Option<String> {
    let trimmed = input?.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((_, data)) => data.trim(),
            None => trimmed,
        },
        None => trimmed,
    };

    if payload.is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}

/// A non-empty base64 image payload without any data-URI prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage(String);

impl NormalizedImage {
    /// Normalize raw inline input into an image, if anything is left.
    pub fn from_inline(input: &str) -> Option<Self> {
        normalize(Some(input)).map(Self)
    }

    /// Wrap an already-encoded payload (e.g. a downloaded image).
    pub fn from_base64(payload: String) -> Option<Self> {
        if payload.trim().is_empty() {
            None
        } else {
            Some(Self(payload))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `data:image/jpeg;base64,<payload>`.
    pub fn data_uri(&self) -> String {
        format!("{}{}", JPEG_DATA_URI_PREFIX, self.0)
    }

}
