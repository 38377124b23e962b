//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router; every path goes to the proxy handler
//! - Wire up middleware (request ID, tracing span)
//! - Serve until the shutdown broadcast fires, then drain

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::net::transport::{HyperTransport, Transport};
use crate::observability::tracing::{request_span, MakeRequestUuid, X_REQUEST_ID};
use crate::proxy::{ProxyOutcome, ProxyService};

/// HTTP front end of the proxy.
pub struct HttpServer<T: Transport = HyperTransport> {
    router: Router,
    service: Arc<ProxyService<T>>,
    drain_timeout: Option<Duration>,
}

impl<T: Transport> HttpServer<T> {
    pub fn new(service: Arc<ProxyService<T>>) -> Self {
        let router = Self::build_router(Arc::clone(&service));
        Self {
            router,
            service,
            drain_timeout: None,
        }
    }

    /// Bound the wait for in-flight exchanges after shutdown.
    pub fn with_drain_timeout(mut self, limit: Duration) -> Self {
        self.drain_timeout = Some(limit);
        self
    }

    fn build_router(service: Arc<ProxyService<T>>) -> Router {
        Router::new()
            .fallback(proxy_handler::<T>)
            .with_state(service)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(
                        TraceLayer::new_for_http()
                            .make_span_with(|request: &Request<Body>| request_span(request)),
                    )
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                // A closed channel means the coordinator is gone; stop as well.
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, no longer accepting");
            })
            .await?;

        if !self.service.drain(self.drain_timeout).await {
            tracing::warn!(
                active = self.service.tracker().active_count(),
                "Drain timeout expired with exchanges still in flight"
            );
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn proxy_handler<T: Transport>(
    State(service): State<Arc<ProxyService<T>>>,
    request: Request<Body>,
) -> ProxyOutcome {
    service.handle(request).await
}
