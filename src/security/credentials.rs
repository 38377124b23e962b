//! Service-to-service credential injection.
//!
//! The proxy authenticates to the upstream on behalf of a caller that the
//! surrounding application has already authenticated. Both values are
//! percent-encoded (UTF-8) so that non-ASCII user names survive as header
//! values; the upstream URL-decodes them.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

use crate::config::Secret;

pub const USERNAME_HEADER: HeaderName = HeaderName::from_static("username");
pub const PASSWORD_HEADER: HeaderName = HeaderName::from_static("password");

/// Pre-encoded credential headers, built once at startup.
#[derive(Clone)]
pub struct CredentialInjector {
    username: HeaderValue,
    password: HeaderValue,
}

impl CredentialInjector {
    pub fn new(username: &str, secret: &Secret) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            username: encode(username)?,
            password: encode(secret.expose())?,
        })
    }

    /// Set `username` and `password`, replacing every inbound occurrence.
    pub fn inject(&self, headers: &mut HeaderMap) {
        headers.insert(USERNAME_HEADER, self.username.clone());
        let mut password = self.password.clone();
        password.set_sensitive(true);
        headers.insert(PASSWORD_HEADER, password);
    }
}

impl std::fmt::Debug for CredentialInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialInjector")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn encode(value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&urlencoding::encode(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(headers: &HeaderMap, name: &HeaderName) -> Vec<String> {
        headers
            .get_all(name)
            .iter()
            .map(|v| urlencoding::decode(v.to_str().unwrap()).unwrap().into_owned())
            .collect()
    }

    #[test]
    fn overwrites_inbound_credentials() {
        let injector = CredentialInjector::new("alice", &Secret::new("secret")).unwrap();
        let mut headers = HeaderMap::new();
        headers.append(USERNAME_HEADER, HeaderValue::from_static("mallory"));
        headers.append(USERNAME_HEADER, HeaderValue::from_static("eve"));
        headers.append(PASSWORD_HEADER, HeaderValue::from_static("guess"));

        injector.inject(&mut headers);

        assert_eq!(decoded(&headers, &USERNAME_HEADER), vec!["alice"]);
        assert_eq!(decoded(&headers, &PASSWORD_HEADER), vec!["secret"]);
    }

    #[test]
    fn non_ascii_username_is_transport_safe() {
        let injector =
            CredentialInjector::new("abcd äöüß", &Secret::new("!#$%&<=>@?")).unwrap();
        let mut headers = HeaderMap::new();
        injector.inject(&mut headers);

        let raw = headers.get(USERNAME_HEADER).unwrap();
        assert!(raw.to_str().unwrap().is_ascii());
        assert_eq!(decoded(&headers, &USERNAME_HEADER), vec!["abcd äöüß"]);
        assert_eq!(decoded(&headers, &PASSWORD_HEADER), vec!["!#$%&<=>@?"]);
    }

    #[test]
    fn password_is_marked_sensitive() {
        let injector = CredentialInjector::new("alice", &Secret::new("secret")).unwrap();
        let mut headers = HeaderMap::new();
        injector.inject(&mut headers);
        assert!(headers.get(PASSWORD_HEADER).unwrap().is_sensitive());
    }

    #[test]
    fn debug_does_not_print_password() {
        let injector = CredentialInjector::new("alice", &Secret::new("hunter2")).unwrap();
        assert!(!format!("{injector:?}").contains("hunter2"));
    }
}
