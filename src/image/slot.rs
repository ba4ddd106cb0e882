//! Image slot resolution.
//!
//! Each logical image position in a request (a "slot") is described by an
//! ordered list of inline field aliases and an ordered list of URL field
//! aliases. Resolution takes the first inline alias that normalizes to
//! something, else fetches the first non-blank URL alias, else fails with
//! `MissingImage`. The alias lists are a compatibility surface: old clients
//! still send every one of these names.

use serde_json::{Map, Value};

use crate::error::{GatewayError, GatewayResult};
use crate::image::fetch::RemoteImageFetcher;
use crate::image::normalize::{normalize, NormalizedImage};

/// Where a slot's image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    InlineBase64(String),
    RemoteUrl(String),
}

/// A named image position and the request fields that may carry it.
#[derive(Debug, Clone, Copy)]
pub struct ImageSlot {
    /// Human-readable name used in error messages ("CNIC image").
    pub label: &'static str,
    /// Inline base64 / data-URI fields, highest priority first.
    pub inline_fields: &'static [&'static str],
    /// Remote URL fields, highest priority first.
    pub url_fields: &'static [&'static str],
}

/// Document image on `/verify-cnic`.
pub const CNIC_SLOT: ImageSlot = ImageSlot {
    label: "CNIC image",
    inline_fields: &["image", "cnicImage", "cnicFront", "imageBase64", "cnic_image", "base64"],
    url_fields: &["imageUrl", "cnicFrontUrl", "cnicImageUrl", "cnicUrl", "url"],
};

/// Reference document image on `/face-verify`.
pub const FACE_CNIC_SLOT: ImageSlot = ImageSlot {
    label: "CNIC image",
    inline_fields: &["cnicImage", "image1", "referenceImage", "cnic_image"],
    url_fields: &["cnicImageUrl", "cnicFrontUrl", "image1Url", "referenceImageUrl"],
};

/// Live selfie on `/face-verify`.
pub const SELFIE_SLOT: ImageSlot = ImageSlot {
    label: "selfie image",
    inline_fields: &["selfie", "selfieImage", "image2", "liveImage", "selfie_image"],
    url_fields: &["selfieUrl", "selfieImageUrl", "image2Url", "liveImageUrl"],
};

/// Storefront photo on `/shop-verify`.
pub const SHOP_SLOT: ImageSlot = ImageSlot {
    label: "shop image",
    inline_fields: &["image", "shopImage", "imageBase64", "shop_image", "base64"],
    url_fields: &["imageUrl", "shopImageUrl", "shopUrl", "url"],
};

impl ImageSlot {
    /// Pick the source for this slot without doing any I/O.
    pub fn source(&self, body: &Map<String, Value>) -> Option<ImageSource> {
        let text = |field: &&str| body.get(*field).and_then(Value::as_str);

        if let Some(inline) = self
            .inline_fields
            .iter()
            .filter_map(text)
            .find_map(|raw| normalize(Some(raw)))
        {
            return Some(ImageSource::InlineBase64(inline));
        }

        self.url_fields
            .iter()
            .filter_map(text)
            .find(|raw| !raw.trim().is_empty())
            .map(|raw| ImageSource::RemoteUrl(raw.to_string()))
    }

    /// Resolve the slot to image data, downloading if only a URL was given.
    pub async fn resolve(
        &self,
        body: &Map<String, Value>,
        fetcher: &RemoteImageFetcher,
    ) -> GatewayResult<NormalizedImage> {
        match self.source(body) {
            Some(ImageSource::InlineBase64(payload)) => NormalizedImage::from_base64(payload)
                .ok_or_else(|| self.missing()),
            Some(ImageSource::RemoteUrl(url)) => {
                let encoded = fetcher.fetch(&url, self.label).await?;
                NormalizedImage::from_base64(encoded).ok_or_else(|| GatewayError::DownloadFailed {
                    url,
                    cause: format!("{} response body was empty", self.label),
                })
            }
            None => Err(self.missing()),
        }
    }

    /// The `MissingImage` error for this slot, listing every accepted field.
    pub fn missing(&self) -> GatewayError {
        GatewayError::MissingImage(format!(
            "Missing {}: provide base64 in one of [{}] or a URL in one of [{}]",
            self.label,
            self.inline_fields.join(", "),
            self.url_fields.join(", "),
        ))
    }
}
