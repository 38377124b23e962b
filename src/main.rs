//! Acrolinx integration proxy.
//!
//! ```text
//!     Caller (browser integration)
//!         │  /proxy/api/...
//!         ▼
//!   ┌───────────────────────────────────────────────────────────┐
//!   │ http::server  (request ID, tracing span)                  │
//!   │     ▼                                                     │
//!   │ proxy::service                                            │
//!   │     ├─ http::request      method gate, mount path, URI    │
//!   │     │    ├─ security::headers      cookie/header filter   │
//!   │     │    └─ security::credentials  username/password      │
//!   │     ├─ net::transport     pooled client, TLS, timeouts    │
//!   │     ├─ http::response     status, headers, body framing   │
//!   │     └─ resilience         failure → 502 / 503             │
//!   └───────────────────────────────────────────────────────────┘
//!         │  /api/...  + username/password headers
//!         ▼
//!     Upstream (target base URL)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use acrolinx_proxy::config::{load_config, ConfigOverrides, LogFormat};
use acrolinx_proxy::http::HttpServer;
use acrolinx_proxy::lifecycle::shutdown::DEFAULT_DRAIN_TIMEOUT;
use acrolinx_proxy::lifecycle::{signals, startup, Shutdown};
use acrolinx_proxy::observability::logging;

/// Reverse proxy that forwards integration requests to an Acrolinx server.
#[derive(Debug, Parser)]
#[command(name = "acrolinx-proxy", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080.
    #[arg(long, env = "PROXY_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Upstream base URL, e.g. https://acrolinx.example.com.
    #[arg(long, env = "PROXY_TARGET_BASE_URL")]
    target_base_url: Option<String>,

    /// Username injected into every upstream request.
    #[arg(long, env = "PROXY_USERNAME")]
    username: Option<String>,

    /// Shared secret injected as the upstream password.
    #[arg(long, env = "PROXY_SHARED_SECRET", hide_env_values = true)]
    shared_secret: Option<String>,

    /// Only cookies with this name prefix are forwarded.
    #[arg(long, env = "PROXY_COOKIE_PREFIX")]
    cookie_prefix: Option<String>,

    /// Path the proxy is mounted under.
    #[arg(long, env = "PROXY_MOUNT_PATH")]
    mount_path: Option<String>,

    /// Upstream connect timeout in milliseconds.
    #[arg(long, env = "PROXY_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: Option<u64>,

    /// Upstream read timeout in milliseconds.
    #[arg(long, env = "PROXY_READ_TIMEOUT_MS")]
    read_timeout_ms: Option<u64>,

    #[arg(long, env = "PROXY_LOG_LEVEL")]
    log_level: Option<String>,

    #[arg(long, env = "PROXY_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,

    /// Send failure details to callers (otherwise only the reason phrase).
    #[arg(long, env = "PROXY_EXPOSE_ERROR_DETAIL")]
    expose_error_detail: Option<bool>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind_address.clone(),
            target_base_url: self.target_base_url.clone(),
            username: self.username.clone(),
            shared_secret: self.shared_secret.clone(),
            cookie_prefix: self.cookie_prefix.clone(),
            mount_path: self.mount_path.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            read_timeout_ms: self.read_timeout_ms,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
            expose_error_detail: self.expose_error_detail,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.overrides())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "acrolinx-proxy starting");
    tracing::debug!(config = ?config, "Configuration loaded");

    let service = Arc::new(startup::build_service(&config)?);
    startup::start_metrics(&config.observability)?;
    let listener = startup::bind(&config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::new(service)
        .with_drain_timeout(DEFAULT_DRAIN_TIMEOUT)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
