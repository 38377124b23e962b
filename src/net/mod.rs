//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound exchange
//!     → connection.rs (ID, phase tracking, in-flight count)
//!     → transport.rs (pooled client: TCP connect, optional TLS, HTTP/1.1)
//!     → Upstream server
//! ```
//!
//! # Design Decisions
//! - The connection pool is created once at startup and shared by all
//!   exchanges; nothing here holds per-request state
//! - Shutdown waits for in-flight exchanges before the pool is dropped

pub mod connection;
pub mod transport;

pub use connection::{ExchangeGuard, ExchangePhase, ExchangeTracker};
pub use transport::{HyperTransport, Transport, TransportError};
