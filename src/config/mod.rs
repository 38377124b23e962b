//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI flags / environment (ConfigOverrides)
//!     → validation.rs (normalise, semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to the proxy service
//! ```
//!
//! # Design Decisions
//! - Config is immutable for the lifetime of the process
//! - Security-sensitive fields (base URL, username, secret) have no usable
//!   default; a missing value refuses startup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, Secret, TimeoutConfig,
    UpstreamConfig,
};
