//! Request handling and transformation.
//!
//! # Responsibilities
//! - Gate inbound methods (GET, POST, PUT, DELETE only)
//! - Build the target URI from the base URL, inbound path and query
//! - Stamp the proxy's own headers (User-Agent, protocol version, base URL)
//! - Apply header filtering and credential injection
//! - Attach the inbound body for POST/PUT, streamed, never buffered
//!
//! # Design Decisions
//! - The translator is a plain value built once from config; translating a
//!   request has no side effects
//! - The base-URL header is idempotent across proxy hops: an inbound value is
//!   forwarded unchanged, otherwise it is derived exactly once

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Method, Request, Uri};

use crate::config::ProxyConfig;
use crate::error::{ErrorKind, ProxyError};
use crate::security::{filter_headers, CredentialInjector};

/// Fixed identifier sent as `User-Agent`.
pub const PROXY_USER_AGENT: &str = "Acrolinx Proxy";

/// Marker for the wire contract version the proxy speaks.
pub const PROXY_VERSION_HEADER: HeaderName =
    HeaderName::from_static("x-acrolinx-integration-proxy-version");
pub const PROXY_VERSION: &str = "2";

/// Lets the upstream build links that route back through the proxy.
pub const BASE_URL_HEADER: HeaderName = HeaderName::from_static("x-acrolinx-base-url");

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// The only methods the proxy forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ProxyMethod {
    pub fn has_body(self) -> bool {
        matches!(self, ProxyMethod::Post | ProxyMethod::Put)
    }

    pub fn as_method(self) -> Method {
        match self {
            ProxyMethod::Get => Method::GET,
            ProxyMethod::Post => Method::POST,
            ProxyMethod::Put => Method::PUT,
            ProxyMethod::Delete => Method::DELETE,
        }
    }
}

impl TryFrom<&Method> for ProxyMethod {
    type Error = ProxyError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match *method {
            Method::GET => Ok(ProxyMethod::Get),
            Method::POST => Ok(ProxyMethod::Post),
            Method::PUT => Ok(ProxyMethod::Put),
            Method::DELETE => Ok(ProxyMethod::Delete),
            _ => Err(ProxyError::new(
                ErrorKind::MethodNotAllowed,
                format!("method {method} is not proxied"),
            )),
        }
    }
}

/// A caller request, already stripped of the proxy's mount path.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: ProxyMethod,
    /// Path below the mount path, e.g. `/api/v1/checking/checks`.
    pub path: String,
    /// Raw query; `Some("")` for a bare trailing `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// `scheme://host[:port]` the caller used to reach the proxy.
    pub origin: String,
    pub body: Option<Body>,
}

impl InboundRequest {
    /// Build from an HTTP request whose path lies below `mount_path`.
    ///
    /// Returns `Ok(None)` when the path is outside the mount path.
    pub fn from_http(request: Request<Body>, mount_path: &str) -> Result<Option<Self>, ProxyError> {
        let (parts, body) = request.into_parts();
        let method = ProxyMethod::try_from(&parts.method)?;

        let Some(path) = strip_mount(parts.uri.path(), mount_path) else {
            return Ok(None);
        };

        Ok(Some(Self {
            method,
            path: path.to_string(),
            query: parts.uri.query().map(str::to_string),
            origin: origin_of(&parts),
            body: method.has_body().then_some(body),
            headers: parts.headers,
        }))
    }
}

/// Path below `mount`, or `None` if `path` is not under it.
pub fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(mount)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

fn origin_of(parts: &Parts) -> String {
    let scheme = parts
        .headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .or_else(|| parts.uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    format!("{scheme}://{host}")
}

/// The request the proxy sends upstream.
#[derive(Debug)]
pub struct OutboundRequest {
    pub uri: Uri,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Body,
}

impl OutboundRequest {
    pub fn into_http(self) -> Result<Request<Body>, axum::http::Error> {
        let mut request = Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(self.body)?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

/// Turns inbound requests into outbound requests for the configured upstream.
#[derive(Debug, Clone)]
pub struct RequestTranslator {
    target_base_url: String,
    mount_path: String,
    cookie_prefix: String,
    credentials: CredentialInjector,
}

impl RequestTranslator {
    pub fn new(config: &ProxyConfig) -> Result<Self, header::InvalidHeaderValue> {
        let upstream = &config.upstream;
        Ok(Self {
            target_base_url: upstream.target_base_url.clone(),
            mount_path: upstream.mount_path.clone(),
            cookie_prefix: upstream.cookie_prefix.clone(),
            credentials: CredentialInjector::new(&upstream.username, &upstream.shared_secret)?,
        })
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// `targetBaseUrl + path + ("?" + query)`.
    pub fn target_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, ProxyError> {
        let mut target = format!("{}{}", self.target_base_url, path);
        if let Some(query) = query {
            target.push('?');
            target.push_str(query);
        }

        let uri = Uri::try_from(target.as_str()).map_err(|e| {
            ProxyError::new(ErrorKind::InvalidTargetUri, format!("{target}: {e}"))
        })?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(ProxyError::new(
                ErrorKind::InvalidTargetUri,
                format!("{target}: not an absolute URI"),
            ));
        }
        Ok(uri)
    }

    pub fn translate(&self, inbound: InboundRequest) -> Result<OutboundRequest, ProxyError> {
        let uri = self.target_uri(&inbound.path, inbound.query.as_deref())?;
        tracing::debug!(target_uri = %uri, "Request URI");

        let mut headers = filter_headers(&inbound.headers, &self.cookie_prefix);
        headers.insert(header::USER_AGENT, HeaderValue::from_static(PROXY_USER_AGENT));
        headers.insert(PROXY_VERSION_HEADER, HeaderValue::from_static(PROXY_VERSION));

        if !headers.contains_key(BASE_URL_HEADER) {
            let base_url = format!("{}{}", inbound.origin, self.mount_path);
            match HeaderValue::from_str(&base_url) {
                Ok(value) => {
                    headers.insert(BASE_URL_HEADER, value);
                }
                Err(_) => tracing::warn!(base_url = %base_url, "Cannot derive base URL header"),
            }
        }

        self.credentials.inject(&mut headers);

        Ok(OutboundRequest {
            uri,
            method: inbound.method.as_method(),
            headers,
            body: inbound.body.unwrap_or_else(Body::empty),
        })
    }
}
