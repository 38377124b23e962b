//! One proxied exchange, end to end.
//!
//! ```text
//! Request<Body>
//!     → InboundRequest (method gate, mount path)
//!     → RequestTranslator (URI, headers, credentials)
//!     → Transport (single attempt, timeouts)
//!     → ResponseRelay                  on success
//!     → FailureClassifier → ProxyError on failure
//!     → ProxyOutcome
//! ```

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::{self, HeaderValue, InvalidHeaderValue};
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{InboundRequest, RequestTranslator};
use crate::http::response::ResponseRelay;
use crate::net::connection::{ExchangeGuard, ExchangePhase, ExchangeTracker};
use crate::net::transport::{HyperTransport, Transport};
use crate::observability::metrics;
use crate::resilience::classify;

/// The forwarding engine. Shared by all requests; holds no per-request state.
pub struct ProxyService<T: Transport = HyperTransport> {
    translator: RequestTranslator,
    transport: T,
    relay: ResponseRelay,
    tracker: ExchangeTracker,
    expose_error_detail: bool,
}

/// What the caller gets back.
#[derive(Debug)]
pub enum ProxyOutcome {
    /// The upstream answered; its response is relayed.
    Relayed(Response<Body>),
    /// The path lies outside the mount path.
    NotFound,
    /// A classified failure.
    Failed {
        error: ProxyError,
        expose_detail: bool,
    },
}

impl ProxyOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyOutcome::Relayed(response) => response.status(),
            ProxyOutcome::NotFound => StatusCode::NOT_FOUND,
            ProxyOutcome::Failed { error, .. } => error.status(),
        }
    }
}

impl IntoResponse for ProxyOutcome {
    fn into_response(self) -> Response<Body> {
        match self {
            ProxyOutcome::Relayed(response) => response,
            ProxyOutcome::NotFound => plain_text(StatusCode::NOT_FOUND, "Not Found".to_string()),
            ProxyOutcome::Failed {
                error,
                expose_detail,
            } => {
                let status = error.status();
                let body = if expose_detail {
                    error.message
                } else {
                    status.canonical_reason().unwrap_or_default().to_string()
                };
                plain_text(status, body)
            }
        }
    }
}

fn plain_text(status: StatusCode, body: String) -> Response<Body> {
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

impl<T: Transport> ProxyService<T> {
    pub fn new(config: &ProxyConfig, transport: T) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            translator: RequestTranslator::new(config)?,
            transport,
            relay: ResponseRelay::new(
                config.upstream.max_buffered_body_bytes,
                config.timeouts.read(),
            ),
            tracker: ExchangeTracker::new(),
            expose_error_detail: config.observability.expose_error_detail,
        })
    }

    pub fn tracker(&self) -> &ExchangeTracker {
        &self.tracker
    }

    /// Forward one request and produce the caller's response.
    pub async fn handle(&self, request: Request<Body>) -> ProxyOutcome {
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let mut exchange = self.tracker.track();

        let outcome = self.exchange(request, &mut exchange).await;
        exchange.advance(ExchangePhase::Done);

        let status = outcome.status();
        metrics::record_request(method.as_str(), status.as_u16(), started);
        tracing::info!(
            exchange_id = %exchange.id(),
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Proxied request"
        );
        outcome
    }

    async fn exchange(&self, request: Request<Body>, exchange: &mut ExchangeGuard) -> ProxyOutcome {
        let inbound = match InboundRequest::from_http(request, self.translator.mount_path()) {
            Ok(Some(inbound)) => inbound,
            Ok(None) => return ProxyOutcome::NotFound,
            Err(error) => return self.fail(exchange, error),
        };

        let outbound = match self.translator.translate(inbound) {
            Ok(outbound) => outbound,
            Err(error) => return self.fail(exchange, error),
        };

        exchange.advance(ExchangePhase::Sending);
        let upstream = match self.transport.send(outbound).await {
            Ok(upstream) => upstream,
            Err(err) => return self.fail(exchange, classify(&err)),
        };

        exchange.advance(ExchangePhase::Relaying);
        match self.relay.relay(upstream).await {
            Ok(response) => ProxyOutcome::Relayed(response),
            Err(error) => self.fail(exchange, error),
        }
    }

    fn fail(&self, exchange: &mut ExchangeGuard, error: ProxyError) -> ProxyOutcome {
        exchange.advance(ExchangePhase::Failed);
        metrics::record_failure(error.kind);
        tracing::warn!(
            exchange_id = %exchange.id(),
            error_kind = %error.kind,
            status = error.status().as_u16(),
            error = %error.message,
            "Request failed"
        );
        ProxyOutcome::Failed {
            error,
            expose_detail: self.expose_error_detail,
        }
    }

    /// Wait for in-flight exchanges. Returns `false` if `limit` expired first.
    pub async fn drain(&self, limit: Option<Duration>) -> bool {
        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active, "Draining in-flight exchanges");
        }
        self.tracker.wait_idle(limit).await
    }
}
