//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (request spans with correlation IDs)
//!
//! Consumers:
//!     → stdout / log aggregation
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - The request ID flows from the server layers into every log line of
//!   the exchange via the request span
//! - Diagnostic failure text is always logged, even when it is hidden from
//!   the caller

pub mod logging;
pub mod metrics;
pub mod tracing;
