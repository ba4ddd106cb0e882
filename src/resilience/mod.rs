//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (remote image GET, upstream POST):
//!     → timeouts.rs (deadline + cancellation)
//!     → On expiry: caller maps Expired to its own timeout error
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Exactly one attempt per call; there is no retry layer

pub mod timeouts;

pub use timeouts::{Deadline, Expired};
