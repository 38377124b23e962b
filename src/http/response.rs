//! Response relay.
//!
//! # Responsibilities
//! - Copy the upstream status verbatim
//! - Copy upstream headers except the three framing headers
//!   (`Content-Length`, `Content-Type`, `Transfer-Encoding`), which are
//!   recomputed here
//! - Relay the body, deriving `Content-Length` from the bytes actually read
//!
//! # Design Decisions
//! - Bodies up to `max_buffered_body_bytes` are buffered so the caller gets
//!   an exact `Content-Length`; larger bodies fall back to chunked framing
//!   with the already-read prefix sent first
//! - Every body frame read is bounded by the read timeout
//! - A body failure before anything was sent is a classified failure; after
//!   the status line went out the caller connection is aborted instead

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Response, StatusCode};
use axum::BoxError;
use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, StreamExt};
use http_body_util::BodyExt;

use crate::error::{error_chain, ErrorKind, ProxyError};
use crate::net::transport::TransportError;
use crate::resilience::{classify_body_error, timeouts};

/// What the upstream answered, before anything is sent to the caller.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl UpstreamResponse {
    /// True when the status never carries an entity. A zero-length body on
    /// any other status is still an entity and keeps its `Content-Type`.
    pub fn has_no_entity(&self) -> bool {
        matches!(self.status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED)
    }
}

/// How the body reaches the caller.
#[derive(Debug)]
pub enum RelayBody {
    /// No entity; no body headers are set.
    Empty,
    /// Whole body read; sent with an exact `Content-Length`.
    Buffered(Bytes),
    /// Body exceeded the buffer limit; sent chunked.
    Streamed(Body),
}

impl RelayBody {
    /// `Content-Length` the caller will see, if known up front.
    pub fn content_length(&self) -> Option<usize> {
        match self {
            RelayBody::Empty => None,
            RelayBody::Buffered(bytes) => Some(bytes.len()),
            RelayBody::Streamed(_) => None,
        }
    }
}

/// Writes upstream responses back to the caller.
#[derive(Debug, Clone, Copy)]
pub struct ResponseRelay {
    max_buffered_body_bytes: usize,
    read_timeout: Option<Duration>,
}

impl ResponseRelay {
    pub fn new(max_buffered_body_bytes: usize, read_timeout: Option<Duration>) -> Self {
        Self {
            max_buffered_body_bytes,
            read_timeout,
        }
    }

    pub async fn relay(&self, upstream: UpstreamResponse) -> Result<Response<Body>, ProxyError> {
        let mut headers = relay_headers(&upstream.headers);
        let content_type = upstream.headers.get(header::CONTENT_TYPE).cloned();
        let status = upstream.status;

        let body = if upstream.has_no_entity() {
            RelayBody::Empty
        } else {
            self.read_body(upstream.body).await?
        };

        if !matches!(body, RelayBody::Empty) {
            if let Some(content_type) = content_type {
                headers.insert(header::CONTENT_TYPE, content_type);
            }
        }
        if let Some(length) = body.content_length() {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        }

        tracing::debug!(
            status = status.as_u16(),
            content_length = ?body.content_length(),
            streamed = matches!(body, RelayBody::Streamed(_)),
            "Relaying upstream response"
        );

        let body = match body {
            RelayBody::Empty => Body::empty(),
            RelayBody::Buffered(bytes) => Body::from(bytes),
            RelayBody::Streamed(body) => body,
        };
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// Buffer up to the limit, then switch to streaming.
    async fn read_body(&self, mut body: Body) -> Result<RelayBody, ProxyError> {
        let mut buffer = BytesMut::new();
        loop {
            let frame = match timeouts::within(self.read_timeout, body.frame()).await {
                Ok(None) => return Ok(RelayBody::Buffered(buffer.freeze())),
                Ok(Some(Ok(frame))) => frame,
                Ok(Some(Err(err))) => return Err(classify_body_error(&err)),
                Err(limit) => {
                    return Err(ProxyError::new(
                        ErrorKind::ReadTimeout,
                        error_chain(&TransportError::ReadTimeout(limit)),
                    ))
                }
            };

            if let Ok(data) = frame.into_data() {
                buffer.extend_from_slice(&data);
                if buffer.len() > self.max_buffered_body_bytes {
                    tracing::debug!(
                        limit = self.max_buffered_body_bytes,
                        "Upstream body exceeds buffer limit, streaming"
                    );
                    return Ok(RelayBody::Streamed(stream_rest(
                        buffer.freeze(),
                        body,
                        self.read_timeout,
                    )));
                }
            }
        }
    }
}

/// Upstream headers minus the ones recomputed locally. Repeated headers keep
/// every value.
fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if name == header::CONTENT_LENGTH
            || name == header::CONTENT_TYPE
            || name == header::TRANSFER_ENCODING
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// `prefix` followed by whatever is left of `body`.
fn stream_rest(prefix: Bytes, body: Body, read_timeout: Option<Duration>) -> Body {
    let rest = stream::unfold(Some(body), move |state| async move {
        let Some(mut body) = state else {
            return None;
        };
        loop {
            match timeouts::within(read_timeout, body.frame()).await {
                Ok(None) => return None,
                Ok(Some(Ok(frame))) => {
                    if let Ok(data) = frame.into_data() {
                        return Some((Ok(data), Some(body)));
                    }
                }
                Ok(Some(Err(err))) => {
                    tracing::warn!(error = %error_chain(&err), "Upstream body failed mid-relay");
                    return Some((Err(BoxError::from(err)), None));
                }
                Err(limit) => {
                    let err = TransportError::ReadTimeout(limit);
                    tracing::warn!(error = %err, "Upstream body stalled mid-relay");
                    return Some((Err(BoxError::from(err)), None));
                }
            }
        }
    });

    let head = stream::once(async move { Ok::<_, BoxError>(prefix) });
    Body::from_stream(head.chain(rest))
}
