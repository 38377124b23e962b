//! Error taxonomy for per-request failures.
//!
//! Every failure a single exchange can hit is reduced to an [`ErrorKind`],
//! which alone decides the caller-facing status code. Startup failures live
//! in [`crate::config::loader::ConfigError`] and never reach a caller.

use axum::http::StatusCode;
use thiserror::Error;

/// Classified failure conditions of one proxied exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Base URL + inbound path + query did not form a valid URI.
    InvalidTargetUri,
    /// Inbound method is not one of GET, POST, PUT, DELETE.
    MethodNotAllowed,
    /// Upstream actively refused the TCP connection.
    ConnectionRefused,
    /// Upstream host or network could not be reached.
    Unreachable,
    /// Upstream host name did not resolve.
    UnknownHost,
    /// TCP connect phase exceeded the connect timeout.
    ConnectTimeout,
    /// Waiting for the upstream response exceeded the read timeout.
    ReadTimeout,
    /// TLS handshake with the upstream failed (untrusted certificate, alert, ...).
    TlsHandshake,
    /// Upstream answered with something that is not a valid HTTP response.
    MalformedResponse,
    /// Upstream body failed before any byte was relayed.
    UpstreamBody,
}

impl ErrorKind {
    /// Caller-facing status for this condition.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidTargetUri => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::ConnectionRefused
            | ErrorKind::Unreachable
            | ErrorKind::UnknownHost
            | ErrorKind::ConnectTimeout
            | ErrorKind::ReadTimeout
            | ErrorKind::UpstreamBody => StatusCode::BAD_GATEWAY,
            ErrorKind::TlsHandshake | ErrorKind::MalformedResponse => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Stable label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidTargetUri => "invalid_target_uri",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::ConnectionRefused => "connection_refused",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::UnknownHost => "unknown_host",
            ErrorKind::ConnectTimeout => "connect_timeout",
            ErrorKind::ReadTimeout => "read_timeout",
            ErrorKind::TlsHandshake => "tls_handshake",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::UpstreamBody => "upstream_body",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-request failure, already classified.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ProxyError {
    pub kind: ErrorKind,
    /// Descriptive text of the underlying failure.
    pub message: String,
}

impl ProxyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

/// Render an error and all of its sources as one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // Several wrappers repeat their cause verbatim in Display.
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
