//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, tracing span)
//!     → handlers.rs (resolve image slots, dispatch upstream, relay)
//!     → status.rs (liveness, version echo)
//! ```

pub mod handlers;
pub mod request;
pub mod server;
pub mod status;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
