//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method and status
//! - `proxy_request_duration_seconds` (histogram): time to produce the
//!   caller response head
//! - `proxy_upstream_failures_total` (counter): classified failures by kind
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::error::ErrorKind;

/// Install the Prometheus exporter with its own scrape listener on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("proxy_requests_total", "Inbound requests by method and status");
    describe_histogram!(
        "proxy_request_duration_seconds",
        Unit::Seconds,
        "Time to produce the caller response head"
    );
    describe_counter!(
        "proxy_upstream_failures_total",
        "Classified upstream failures by kind"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    let status = status.to_string();
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(started.elapsed().as_secs_f64());
}

pub fn record_failure(kind: ErrorKind) {
    counter!("proxy_upstream_failures_total", "kind" => kind.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_exporter_is_harmless() {
        record_request("GET", 200, Instant::now());
        record_failure(ErrorKind::ConnectionRefused);
    }
}
