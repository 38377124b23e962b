//! Trust-boundary subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound headers
//!     → headers.rs (drop connection-level headers, filter cookies)
//!     → [translator adds proxy headers]
//!     → credentials.rs (stamp username/password)
//!     → Outbound headers
//! ```
//!
//! # Design Decisions
//! - Both steps are pure transformations of a HeaderMap
//! - Inbound credentials are never forwarded; injected values always win

pub mod credentials;
pub mod headers;

pub use credentials::CredentialInjector;
pub use headers::filter_headers;
