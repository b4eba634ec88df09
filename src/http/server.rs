//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the admin handlers
//! - Wire up middleware (request ID, tracing, body limit, timeout, metrics)
//! - Bind server to listener and stop on shutdown

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::ServiceConfig;
use crate::http::request::{request_id_of, MakeRequestUuidV4};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::relay::RelayBridge;
use crate::routing::ConfigService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config_service: Arc<ConfigService>,
    pub relay: RelayBridge,
    pub settings: Arc<ServiceConfig>,
    /// Fires on shutdown; in-flight relay calls are abandoned.
    pub shutdown: Shutdown,
}

/// HTTP server for the admin API.
pub struct HttpServer {
    router: Router,
    settings: Arc<ServiceConfig>,
}

impl HttpServer {
    /// Create a new HTTP server over the given state.
    pub fn new(state: AppState) -> Self {
        let settings = state.settings.clone();
        let router = Self::build_router(state);
        Self { router, settings }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let admin = &state.settings.admin;
        let timeout = Duration::from_secs(admin.request_timeout_secs);
        let body_limit = admin.max_body_bytes;

        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "admin_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id_of(request),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(timeout));

        setup_admin_router(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(layers)
    }

    /// Router with all layers, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener, until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            store = %self.settings.store.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the settings.
    pub fn settings(&self) -> &ServiceConfig {
        &self.settings
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
