//! Wallet- and route-scoped outbound fetches.
//!
//! Composes `RouteStore` resolution with `ProxyDispatcher`. Holds no state
//! of its own.

use reqwest::Response;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::dispatch::{DispatchError, OutboundRequest, ProxyDispatcher};
use crate::routing::{ResolvedRoute, RouteStore, StorageError};

/// Errors from a relayed fetch.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The blocking storage read was cancelled or panicked.
    #[error("route lookup task failed: {0}")]
    Blocking(#[source] tokio::task::JoinError),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Resolves a proxy for a wallet or route key, then dispatches through it.
#[derive(Debug, Clone)]
pub struct RelayBridge {
    store: Arc<RouteStore>,
    dispatcher: Arc<ProxyDispatcher>,
}

impl RelayBridge {
    pub fn new(store: Arc<RouteStore>, dispatcher: Arc<ProxyDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Fetch through the proxy assigned to `wallet` (or the default route).
    pub async fn fetch_by_wallet(
        &self,
        request: OutboundRequest,
        wallet: Option<&str>,
    ) -> RelayResult<Response> {
        let route = self.route_for_wallet(wallet).await?;
        tracing::debug!(wallet = wallet.unwrap_or_default(), url = %request.url, "Relaying by wallet");
        Ok(self.dispatcher.fetch_via_proxy(request, &route.proxy).await?)
    }

    /// Fetch through the proxy of the named route (or the default route).
    pub async fn fetch_by_route(
        &self,
        request: OutboundRequest,
        route_key: &str,
    ) -> RelayResult<Response> {
        let route = self.route_for_key(route_key).await?;
        tracing::debug!(route = route_key, url = %request.url, "Relaying by route");
        Ok(self.dispatcher.fetch_via_proxy(request, &route.proxy).await?)
    }

    /// `fetch_by_wallet`, abandoned once `cancel` resolves.
    pub async fn fetch_by_wallet_until<C>(
        &self,
        request: OutboundRequest,
        wallet: Option<&str>,
        cancel: C,
    ) -> RelayResult<Response>
    where
        C: Future<Output = ()>,
    {
        let route = self.route_for_wallet(wallet).await?;
        Ok(self
            .dispatcher
            .fetch_via_proxy_until(request, &route.proxy, cancel)
            .await?)
    }

    async fn route_for_wallet(&self, wallet: Option<&str>) -> RelayResult<ResolvedRoute> {
        let wallet = wallet.map(str::to_string);
        self.with_refreshed_store(move |store| store.resolve_by_wallet(wallet.as_deref()))
            .await
    }

    async fn route_for_key(&self, route_key: &str) -> RelayResult<ResolvedRoute> {
        let route_key = route_key.to_string();
        self.with_refreshed_store(move |store| store.resolve(&route_key)).await
    }

    /// Refresh the store off the async runtime, then resolve.
    async fn with_refreshed_store<F>(&self, resolve: F) -> RelayResult<ResolvedRoute>
    where
        F: FnOnce(&RouteStore) -> ResolvedRoute + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || -> RelayResult<ResolvedRoute> {
            store.refresh()?;
            Ok(resolve(&store))
        })
        .await
        .map_err(RelayError::Blocking)?
    }
}
