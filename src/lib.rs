//! Identity-verification gateway library.
//!
//! Accepts CNIC, face-match and shop verification requests, resolves each
//! image from inline base64 or an allow-listed remote URL, and forwards the
//! normalized payload to a single upstream verification engine, relaying its
//! answer verbatim.

pub mod config;
pub mod error;
pub mod http;
pub mod image;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
