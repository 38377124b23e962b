//! Forwarding engine.
//!
//! # Data Flow
//! ```text
//! axum fallback handler
//!     → service.rs (translate, send, relay or classify)
//!     → ProxyOutcome → caller response
//! ```
//!
//! # Design Decisions
//! - Exactly one outbound attempt per inbound request
//! - Every exit path drops the upstream connection or returns it to the
//!   pool; nothing is held past the end of `handle`

pub mod service;

pub use service::{ProxyOutcome, ProxyService};
