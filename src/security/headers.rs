//! Inbound header filtering at the trust boundary.
//!
//! # Responsibilities
//! - Drop connection-level headers the proxy must own itself
//! - Reduce the `Cookie` header to cookies carrying the configured prefix
//! - Pass every other header through untouched, duplicates included

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Headers that never cross the proxy in either form.
pub static DISALLOWED_HEADERS: [HeaderName; 5] = [
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::EXPECT,
    header::HOST,
    header::UPGRADE,
];

/// Whether `name` may be forwarded at all. Header names are lowercase in
/// `HeaderName`, so this comparison is case-insensitive.
pub fn is_disallowed(name: &HeaderName) -> bool {
    DISALLOWED_HEADERS.contains(name)
}

/// Produce the subset of `headers` eligible for forwarding.
///
/// All `Cookie` occurrences are merged into at most one header holding only
/// the segments whose name starts with `cookie_prefix` (ASCII
/// case-insensitive). If nothing matches, no cookie header is emitted.
pub fn filter_headers(headers: &HeaderMap, cookie_prefix: &str) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    let mut cookies = Vec::new();

    for (name, value) in headers {
        if is_disallowed(name) {
            continue;
        }
        if name == header::COOKIE {
            if let Ok(raw) = value.to_str() {
                cookies.extend(matching_cookies(raw, cookie_prefix));
            }
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }

    if !cookies.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&cookies.join(";")) {
            forwarded.insert(header::COOKIE, value);
        }
    }

    forwarded
}

/// Cookie segments of `raw` whose name carries `prefix`, trimmed.
pub fn matching_cookies<'a>(raw: &'a str, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    raw.split(';')
        .map(str::trim)
        .filter(move |segment| cookie_name(segment).is_some_and(|name| has_prefix(name, prefix)))
}

fn cookie_name(segment: &str) -> Option<&str> {
    let name = segment.split('=').next()?.trim();
    (!name.is_empty()).then_some(name)
}

fn has_prefix(name: &str, prefix: &str) -> bool {
    name.len() >= prefix.len()
        && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
