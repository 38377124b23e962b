//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call:
//!     → timeouts.rs (bound the wait for the response head and each body frame)
//!     → On failure: classify.rs (walk the error chain, pick an ErrorKind)
//!     → ProxyError (status code + message for the caller)
//! ```
//!
//! # Design Decisions
//! - No retries: every inbound request results in at most one outbound attempt
//! - Classification looks at error types, not at message text, except for
//!   resolver failures which the connector reports only as text

pub mod classify;
pub mod timeouts;

pub use classify::{classify, classify_body_error};
