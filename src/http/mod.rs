//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Caller connection
//!     → server.rs (Axum setup, request ID, tracing span)
//!     → request.rs (method gate, mount path, outbound request)
//!     → [transport sends upstream]
//!     → response.rs (status, filtered headers, body framing)
//!     → Send to caller
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, OutboundRequest, RequestTranslator};
pub use response::{ResponseRelay, UpstreamResponse};
pub use server::HttpServer;
