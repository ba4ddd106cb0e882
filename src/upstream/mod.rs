//! Upstream engine subsystem.
//!
//! # Data Flow
//! ```text
//! resolved images
//!     → payload.rs (field layout per engine endpoint)
//!     → dispatch.rs (POST under deadline)
//!     → UpstreamResponse (status + JSON-or-raw body), relayed as-is
//! ```

pub mod dispatch;
pub mod payload;

pub use dispatch::{UpstreamDispatcher, UpstreamResponse};
pub use payload::{UpstreamRequest, FACE_VERIFY_PATH, SHOP_VERIFY_PATH, VERIFY_CNIC_PATH};
