//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls and body reads with the read timeout
//! - Treat an unset timeout as "wait forever"
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the wrapped future is dropped on expiry,
//!   which abandons its connection
//! - Timeout errors carry the limit that was exceeded

use std::future::Future;
use std::time::Duration;

/// Run `fut`, giving up after `limit`. `Err` carries the exceeded limit.
pub async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, Duration> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| limit),
        None => Ok(fut.await),
    }
}
