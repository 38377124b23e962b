//! Failure classification.
//!
//! Maps a [`TransportError`] to an [`ErrorKind`] (and with it a status code)
//! by walking the error's source chain:
//!
//! | found in chain                                   | kind                |
//! |--------------------------------------------------|---------------------|
//! | `rustls::Error` (direct or nested in `io::Error`) | `TlsHandshake`      |
//! | `hyper::Error` parse / incomplete message        | `MalformedResponse` |
//! | `hyper::Error` timeout                           | `ReadTimeout`       |
//! | `io::ErrorKind::ConnectionRefused`               | `ConnectionRefused` |
//! | `io::ErrorKind::TimedOut`                        | `ConnectTimeout`    |
//! | `io::ErrorKind::{Host,Network}Unreachable`       | `Unreachable`       |
//! | connector "dns error"                            | `UnknownHost`       |
//!
//! A TLS finding anywhere wins; otherwise the outermost finding wins.

use std::error::Error as StdError;
use std::io;

use crate::error::{error_chain, ErrorKind, ProxyError};
use crate::net::transport::TransportError;

/// Classify a failed outbound call. The message is the full error chain.
pub fn classify(err: &TransportError) -> ProxyError {
    let kind = match err {
        TransportError::ReadTimeout(_) => ErrorKind::ReadTimeout,
        TransportError::Request(_) => ErrorKind::InvalidTargetUri,
        TransportError::Client(client) => classify_chain(client).unwrap_or(if client.is_connect() {
            ErrorKind::Unreachable
        } else {
            ErrorKind::UpstreamBody
        }),
    };
    ProxyError::new(kind, error_chain(err))
}

/// Classify an error that surfaced while reading the upstream body. The
/// response head was valid, so protocol errors here are body failures.
pub fn classify_body_error(err: &(dyn StdError + 'static)) -> ProxyError {
    let kind = match classify_chain(err) {
        Some(kind @ (ErrorKind::ReadTimeout | ErrorKind::TlsHandshake)) => kind,
        _ => ErrorKind::UpstreamBody,
    };
    ProxyError::new(kind, error_chain(err))
}

/// Kind of the most telling error in `err`'s source chain, if any.
pub fn classify_chain(err: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    let mut found = None;
    let mut current = Some(err);
    while let Some(e) = current {
        match inspect(e) {
            Some(ErrorKind::TlsHandshake) => return Some(ErrorKind::TlsHandshake),
            Some(kind) if found.is_none() => found = Some(kind),
            _ => {}
        }
        current = e.source();
    }
    found
}

fn inspect(e: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    if e.is::<rustls::Error>() {
        return Some(ErrorKind::TlsHandshake);
    }
    if let Some(err) = e.downcast_ref::<hyper::Error>() {
        if err.is_parse() || err.is_parse_status() || err.is_incomplete_message() {
            return Some(ErrorKind::MalformedResponse);
        }
        if err.is_timeout() {
            return Some(ErrorKind::ReadTimeout);
        }
        return None;
    }
    if let Some(err) = e.downcast_ref::<io::Error>() {
        return inspect_io(err);
    }
    if e.to_string().starts_with("dns error") {
        return Some(ErrorKind::UnknownHost);
    }
    None
}

fn inspect_io(err: &io::Error) -> Option<ErrorKind> {
    // io::Error::source() skips the wrapped payload, and hyper-rustls nests
    // one io::Error inside another, so unwrap payloads until none is left.
    let mut payload = err.get_ref();
    while let Some(inner) = payload {
        if inner.is::<rustls::Error>() {
            return Some(ErrorKind::TlsHandshake);
        }
        payload = inner.downcast_ref::<io::Error>().and_then(io::Error::get_ref);
    }
    match err.kind() {
        io::ErrorKind::ConnectionRefused => Some(ErrorKind::ConnectionRefused),
        io::ErrorKind::TimedOut => Some(ErrorKind::ConnectTimeout),
        io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::AddrNotAvailable => Some(ErrorKind::Unreachable),
        _ => None,
    }
}
