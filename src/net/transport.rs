//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Own the pooled connection manager shared by all requests
//! - Enforce the connect timeout (connector) and read timeout (per call)
//! - Speak plain HTTP or TLS (rustls) depending on the target scheme
//! - Surface failures unchanged for classification; never retry, never
//!   follow redirects
//!
//! # Design Decisions
//! - One `Transport` trait, one concrete implementation (hyper-util legacy
//!   client); tests substitute their own implementation
//! - A timed-out call drops its in-flight connection instead of returning it
//!   to the pool

use std::fs::File;
use std::future::Future;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;

use crate::config::ProxyConfig;
use crate::http::request::OutboundRequest;
use crate::http::response::UpstreamResponse;
use crate::resilience::timeouts;

/// Pooled client used for every upstream call.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Executes outbound requests.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, TransportError>> + Send;
}

/// Why an outbound call produced no response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect, TLS or protocol failure reported by the client.
    #[error(transparent)]
    Client(#[from] hyper_util::client::legacy::Error),

    /// No response head arrived within the read timeout.
    #[error("upstream did not respond within {0:?}")]
    ReadTimeout(Duration),

    /// The outbound request could not be assembled.
    #[error("invalid outbound request: {0}")]
    Request(#[from] axum::http::Error),
}

/// Startup failures while building the transport.
#[derive(Debug, Error)]
pub enum TransportSetupError {
    #[error("cannot read CA bundle: {0}")]
    CaBundle(#[from] std::io::Error),

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),
}

/// The hyper-util backed transport.
#[derive(Clone)]
pub struct HyperTransport {
    client: HttpClient,
    read_timeout: Option<Duration>,
}

impl HyperTransport {
    pub fn new(config: &ProxyConfig) -> Result<Self, TransportSetupError> {
        let mut http_connector = HttpConnector::new();
        http_connector.set_connect_timeout(config.timeouts.connect());
        http_connector.set_nodelay(true);
        http_connector.enforce_http(false);

        let tls = client_tls_config(config.upstream.ca_cert_path.as_deref())?;
        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.upstream.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.upstream.pool_max_idle_per_host)
            .pool_timer(TokioTimer::new())
            .build(connector);

        tracing::info!(
            connect_timeout = ?config.timeouts.connect(),
            read_timeout = ?config.timeouts.read(),
            max_idle_per_host = config.upstream.pool_max_idle_per_host,
            "Upstream connection pool configured"
        );

        Ok(Self {
            client,
            read_timeout: config.timeouts.read(),
        })
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        let request = request.into_http()?;
        let response = timeouts::within(self.read_timeout, self.client.request(request))
            .await
            .map_err(TransportError::ReadTimeout)??;

        let (parts, body) = response.into_parts();
        Ok(UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body: Body::new(body),
        })
    }
}

/// rustls client config trusting the platform roots plus an optional PEM bundle.
fn client_tls_config(ca_bundle: Option<&Path>) -> Result<ClientConfig, TransportSetupError> {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        tracing::warn!(error = %err, "Skipping unreadable platform certificate source");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(added, ignored, "Loaded platform root certificates");

    if let Some(path) = ca_bundle {
        let mut reader = BufReader::new(File::open(path)?);
        let mut added = 0usize;
        for cert in rustls_pemfile::certs(&mut reader) {
            roots.add(cert?)?;
            added += 1;
        }
        tracing::info!(path = %path.display(), certificates = added, "Loaded extra CA certificates");
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth())
}
