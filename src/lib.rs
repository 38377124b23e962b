//! Acrolinx integration proxy library.
//!
//! Forwards caller requests under a mount path to one fixed upstream,
//! filtering headers and cookies, injecting service credentials, and
//! relaying the upstream response or a classified failure.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::{ErrorKind, ProxyError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::ProxyService;
