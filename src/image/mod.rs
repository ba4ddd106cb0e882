//! Image acquisition subsystem.
//!
//! # Data Flow
//! ```text
//! request body (JSON object)
//!     → slot.rs (pick inline field or URL field per slot)
//!         inline → normalize.rs (strip data-URI prefix, trim)
//!         URL    → guard.rs (https + trusted host) → fetch.rs (GET, base64)
//!     → NormalizedImage per slot
//! ```
//!
//! # Design Decisions
//! - Inline data always wins; a URL is only fetched when no inline field resolves
//! - The allow-list runs before any socket is opened
//! - Base64 is passed through unvalidated

pub mod fetch;
pub mod guard;
pub mod normalize;
pub mod slot;

pub use fetch::RemoteImageFetcher;
pub use guard::{assert_allowed, UrlGuardError, TRUSTED_DOMAIN};
pub use normalize::{normalize, NormalizedImage};
pub use slot::{ImageSlot, ImageSource};
