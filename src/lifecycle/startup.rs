//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the routing document and build the service graph
//!   (storage → RouteStore → ConfigService, ProxyDispatcher → RelayBridge)
//! - Start optional background pieces (metrics exporter)
//!
//! # Design Decisions
//! - Fail fast: a missing or malformed routing document is fatal at startup
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::dispatch::{DispatchError, ProxyDispatcher};
use crate::http::AppState;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::relay::RelayBridge;
use crate::routing::{ConfigService, ConfigStorage, FileStorage, RouteStore, StorageError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("routing document: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Build application state over the file named in `settings.store.path`.
pub fn build_state(settings: ServiceConfig) -> Result<AppState, StartupError> {
    let storage: Arc<dyn ConfigStorage> = Arc::new(FileStorage::new(&settings.store.path));
    build_state_with_storage(settings, storage)
}

/// Build application state over any storage backend.
pub fn build_state_with_storage(
    settings: ServiceConfig,
    storage: Arc<dyn ConfigStorage>,
) -> Result<AppState, StartupError> {
    let store = Arc::new(RouteStore::open(storage)?);
    let dispatcher = Arc::new(ProxyDispatcher::new(settings.dispatch.clone())?);

    Ok(AppState {
        config_service: Arc::new(ConfigService::new(store.clone())),
        relay: RelayBridge::new(store, dispatcher),
        settings: Arc::new(settings),
        shutdown: Shutdown::new(),
    })
}

/// Start the metrics exporter when enabled.
pub fn start_metrics(settings: &ServiceConfig) {
    if !settings.observability.metrics_enabled {
        return;
    }
    match settings.observability.metrics_address.parse::<SocketAddr>() {
        Ok(addr) => metrics::init_metrics(addr),
        Err(_) => tracing::error!(
            metrics_address = %settings.observability.metrics_address,
            "Failed to parse metrics address"
        ),
    }
}
