//! Configuration loading from disk and command-line overrides.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{LogFormat, ProxyConfig, Secret};
use crate::config::validation::{normalize_config, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied on the command line or through the environment.
///
/// Every `Some` replaces whatever the config file said.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub target_base_url: Option<String>,
    pub username: Option<String>,
    pub shared_secret: Option<String>,
    pub cookie_prefix: Option<String>,
    pub mount_path: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub expose_error_detail: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut ProxyConfig) {
        if let Some(v) = self.bind_address {
            config.listener.bind_address = v;
        }
        if let Some(v) = self.target_base_url {
            config.upstream.target_base_url = v;
        }
        if let Some(v) = self.username {
            config.upstream.username = v;
        }
        if let Some(v) = self.shared_secret {
            config.upstream.shared_secret = Secret::new(v);
        }
        if let Some(v) = self.cookie_prefix {
            config.upstream.cookie_prefix = v;
        }
        if let Some(v) = self.mount_path {
            config.upstream.mount_path = v;
        }
        if self.connect_timeout_ms.is_some() {
            config.timeouts.connect_ms = self.connect_timeout_ms;
        }
        if self.read_timeout_ms.is_some() {
            config.timeouts.read_ms = self.read_timeout_ms;
        }
        if let Some(v) = self.log_level {
            config.observability.log_level = v;
        }
        if let Some(v) = self.log_format {
            config.observability.log_format = v;
        }
        if let Some(v) = self.expose_error_detail {
            config.observability.expose_error_detail = v;
        }
    }
}

/// Parse a TOML configuration file without validating it.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Normalise and validate a fully assembled configuration.
pub fn finalize_config(mut config: ProxyConfig) -> Result<ProxyConfig, ConfigError> {
    normalize_config(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load configuration from an optional file plus overrides, then validate.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    overrides.apply(&mut config);
    finalize_config(config)
}
