//! Upstream request bodies.

use serde_json::{Map, Value};

use crate::image::NormalizedImage;

/// Engine path for CNIC document checks.
pub const VERIFY_CNIC_PATH: &str = "/verify-cnic";
/// Engine path for CNIC-vs-selfie face matching.
pub const FACE_VERIFY_PATH: &str = "/face-verify";
/// Engine path for storefront checks.
pub const SHOP_VERIFY_PATH: &str = "/shop-verify";

/// JSON object sent to the engine. Built only from resolved images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamRequest {
    fields: Map<String, Value>,
}

impl UpstreamRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field` with the bare payload and `<field>DataUri` with its data URI.
    pub fn with_image(mut self, field: &str, image: &NormalizedImage) -> Self {
        self.fields
            .insert(field.to_string(), Value::String(image.as_str().to_string()));
        self.fields
            .insert(format!("{field}DataUri"), Value::String(image.data_uri()));
        self
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }
}

/// `/verify-cnic` body: `{ image, imageDataUri }`.
pub fn cnic_request(image: &NormalizedImage) -> UpstreamRequest {
    UpstreamRequest::new().with_image("image", image)
}

/// `/face-verify` body: `{ cnicImage, selfieImage }` plus data URIs.
pub fn face_request(cnic: &NormalizedImage, selfie: &NormalizedImage) -> UpstreamRequest {
    UpstreamRequest::new()
        .with_image("cnicImage", cnic)
        .with_image("selfieImage", selfie)
}

/// `/shop-verify` body: `{ image, imageDataUri }`.
pub fn shop_request(image: &NormalizedImage) -> UpstreamRequest {
    UpstreamRequest::new().with_image("image", image)
}
