//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: UPSTREAM_BASE_URL, PORT, ...)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → passed into each component constructor at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no process-wide global
//! - All fields have defaults except the upstream base URL
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{
    HttpConfig, ListenerConfig, LogFormat, ObservabilityConfig, RemoteConfig, UpstreamConfig,
};
