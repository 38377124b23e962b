//! Startup orchestration.
//!
//! Fail fast: any error here is fatal and the process exits non-zero before
//! the listener accepts a single request. Order: transport (TLS roots, pool),
//! service, metrics exporter, listener.

use std::net::{AddrParseError, SocketAddr};

use axum::http::header::InvalidHeaderValue;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ObservabilityConfig, ProxyConfig};
use crate::net::transport::{HyperTransport, TransportSetupError};
use crate::observability::metrics;
use crate::proxy::ProxyService;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("upstream transport: {0}")]
    Transport(#[from] TransportSetupError),

    #[error("credentials cannot be sent as header values: {0}")]
    Credentials(#[from] InvalidHeaderValue),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the forwarding engine with the pooled hyper transport.
pub fn build_service(config: &ProxyConfig) -> Result<ProxyService, StartupError> {
    let transport = HyperTransport::new(config)?;
    let service = ProxyService::new(config, transport)?;
    tracing::info!(
        target_base_url = %config.upstream.target_base_url,
        mount_path = %config.upstream.mount_path,
        cookie_prefix = %config.upstream.cookie_prefix,
        "Proxy service ready"
    );
    Ok(service)
}

/// Install the Prometheus exporter if enabled.
pub fn start_metrics(config: &ObservabilityConfig) -> Result<(), StartupError> {
    if !config.metrics_enabled {
        return Ok(());
    }
    let addr: SocketAddr = config.metrics_address.parse()?;
    metrics::init_metrics(addr)?;
    Ok(())
}

pub async fn bind(config: &ProxyConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    Ok(listener)
}
