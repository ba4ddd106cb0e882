//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound every outbound network call with a deadline
//! - Cancel the in-flight call when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities: on expiry the wrapped future is dropped,
//!   which aborts the request and releases its connection
//! - The timer itself is dropped on every exit path, success or failure
//! - Expiry is reported as [`Expired`]; callers translate it into their own
//!   error variant (`Timeout` for downloads, `UpstreamTimeout` for dispatch)

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// A deadline elapsed before the wrapped operation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {limit_ms}ms elapsed")]
pub struct Expired {
    pub limit_ms: u64,
}

/// Fixed per-call time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    limit: Duration,
}

impl Deadline {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            limit: Duration::from_millis(ms),
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.limit.as_millis() as u64
    }

    /// Run `fut` to completion or cancel it once the budget is spent.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Expired>
    where
        F: Future,
    {
        tokio::time::timeout(self.limit, fut)
            .await
            .map_err(|_| Expired {
                limit_ms: self.as_millis(),
            })
    }
}
