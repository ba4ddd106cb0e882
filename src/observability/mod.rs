//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//! Request spans carry the x-request-id set in http/request.rs.
//! ```

pub mod logging;
pub mod metrics;
