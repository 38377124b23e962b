//! Configuration normalisation and validation.
//!
//! Validation is a pure function `&ProxyConfig -> Result<(), Vec<ValidationError>>`
//! and reports every problem at once. It runs before the config is accepted;
//! any error is fatal at startup.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("upstream.target_base_url {url:?} is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{field} {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Bring values into canonical form before validation.
///
/// Strips trailing slashes from the base URL and mount path and gives the
/// mount path a leading slash.
pub fn normalize_config(config: &mut ProxyConfig) {
    let upstream = &mut config.upstream;
    upstream.target_base_url = upstream.target_base_url.trim().trim_end_matches('/').to_string();
    upstream.username = upstream.username.trim().to_string();

    let mount = upstream.mount_path.trim().trim_matches('/');
    upstream.mount_path = if mount.is_empty() {
        String::new()
    } else {
        format!("/{mount}")
    };
}

/// Check a (normalised) configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let upstream = &config.upstream;

    if upstream.target_base_url.trim().is_empty() {
        errors.push(ValidationError::Blank("upstream.target_base_url"));
    } else if let Err(reason) = check_base_url(&upstream.target_base_url) {
        errors.push(ValidationError::InvalidBaseUrl {
            url: upstream.target_base_url.clone(),
            reason,
        });
    }
    if upstream.username.trim().is_empty() {
        errors.push(ValidationError::Blank("upstream.username"));
    }
    if upstream.shared_secret.is_blank() {
        errors.push(ValidationError::Blank("upstream.shared_secret"));
    }
    if upstream.cookie_prefix.trim().is_empty() {
        errors.push(ValidationError::Blank("upstream.cookie_prefix"));
    }
    if upstream.max_buffered_body_bytes == 0 {
        errors.push(ValidationError::Zero("upstream.max_buffered_body_bytes"));
    }
    if config.timeouts.connect_ms == Some(0) {
        errors.push(ValidationError::Zero("timeouts.connect_ms"));
    }
    if config.timeouts.read_ms == Some(0) {
        errors.push(ValidationError::Zero("timeouts.read_ms"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Secret;

    fn valid_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.upstream.target_base_url = "http://localhost:8031/".into();
        config.upstream.username = "alice".into();
        config.upstream.shared_secret = Secret::new("secret");
        config
    }

    #[test]
    fn normalize_strips_trailing_slashes() {
        let mut config = valid_config();
        config.upstream.mount_path = "proxy/".into();
        normalize_config(&mut config);

        assert_eq!(config.upstream.target_base_url, "http://localhost:8031");
        assert_eq!(config.upstream.mount_path, "/proxy");
    }

    #[test]
    fn root_mount_normalizes_to_empty() {
        let mut config = valid_config();
        config.upstream.mount_path = "/".into();
        normalize_config(&mut config);
        assert_eq!(config.upstream.mount_path, "");
    }

    #[test]
    fn valid_config_passes() {
        let mut config = valid_config();
        normalize_config(&mut config);
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let config = ProxyConfig::default();
        let errors = validate_config(&config).unwrap_err();

        assert!(errors.contains(&ValidationError::Blank("upstream.target_base_url")));
        assert!(errors.contains(&ValidationError::Blank("upstream.username")));
        assert!(errors.contains(&ValidationError::Blank("upstream.shared_secret")));
    }

    #[test]
    fn whitespace_secret_is_blank() {
        let mut config = valid_config();
        config.upstream.shared_secret = Secret::new("   ");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::Blank("upstream.shared_secret")]);
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let mut config = valid_config();
        config.upstream.target_base_url = "localhost:8031/api".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn base_url_with_query_is_rejected() {
        let mut config = valid_config();
        config.upstream.target_base_url = "http://localhost:8031?x=1".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = valid_config();
        config.timeouts.connect_ms = Some(0);
        config.timeouts.read_ms = Some(0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
