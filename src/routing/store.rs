//! Route lookup over the Configuration Document.
//!
//! # Responsibilities
//! - Hold the in-memory copy of the document
//! - Re-read it from storage on `refresh`
//! - Answer default / named / wallet lookups with a fallback chain
//!
//! # Design Decisions
//! - Lookups never fail: a missing entry falls back to `default`, then to the
//!   zeroed route (loopback, no proxy)
//! - A failed refresh leaves the previous copy in place; the caller decides
//!   whether to abort the operation

use std::sync::{Arc, RwLock, RwLockReadGuard};

use crate::routing::document::{normalize_address, ResolvedRoute, RoutingDocument};
use crate::routing::storage::{ConfigStorage, StorageResult};

/// Route key used when callers do not name one.
pub const DEFAULT_ROUTE_KEY: &str = "default";

/// Loaded routing configuration plus its backing storage.
pub struct RouteStore {
    storage: Arc<dyn ConfigStorage>,
    document: RwLock<RoutingDocument>,
}

impl RouteStore {
    /// Open a store and load the document once.
    pub fn open(storage: Arc<dyn ConfigStorage>) -> StorageResult<Self> {
        let document = storage.load()?;
        tracing::info!(
            location = %storage.location(),
            wallets = document.wallets.len(),
            owners = document.owners.len(),
            routes = document.routes.len(),
            "Routing configuration loaded"
        );
        Ok(Self {
            storage,
            document: RwLock::new(document),
        })
    }

    /// Re-read the full document from storage, replacing the in-memory copy.
    pub fn refresh(&self) -> StorageResult<()> {
        self.load_fresh().map(drop)
    }

    /// Re-read the document and return the copy that was just loaded.
    ///
    /// The cache lock is held across the read, so a concurrent refresh can
    /// never install an older document over a newer one. Mutations patch the
    /// returned value rather than a later `snapshot`.
    pub fn load_fresh(&self) -> StorageResult<RoutingDocument> {
        let mut cached = self.write_guard();
        let document = self.storage.load().map_err(|e| {
            tracing::error!(location = %self.storage.location(), error = %e, "Configuration refresh failed");
            e
        })?;
        *cached = document.clone();
        Ok(document)
    }

    /// Clone of the in-memory document.
    pub fn snapshot(&self) -> RoutingDocument {
        self.read_guard().clone()
    }

    /// Persist `document` whole and adopt it as the in-memory copy.
    pub fn commit(&self, document: RoutingDocument) -> StorageResult<()> {
        let mut cached = self.write_guard();
        self.storage.save(&document)?;
        *cached = document;
        Ok(())
    }

    /// Resolve a named route, falling back to `default`, then the zeroed route.
    pub fn resolve(&self, route_key: &str) -> ResolvedRoute {
        let doc = self.read_guard();
        let route = doc.routes.get(route_key).or(doc.default.as_ref());
        ResolvedRoute::from_route(route)
    }

    /// Resolve a wallet's route, falling back to `default`, then the zeroed route.
    ///
    /// An empty or missing address behaves like `resolve("default")`.
    pub fn resolve_by_wallet(&self, address: Option<&str>) -> ResolvedRoute {
        let normalized = address.map(normalize_address).filter(|a| !a.is_empty());
        let Some(normalized) = normalized else {
            return self.resolve(DEFAULT_ROUTE_KEY);
        };

        let doc = self.read_guard();
        let route = doc.wallets.get(&normalized).or(doc.default.as_ref());
        ResolvedRoute::from_route(route)
    }

    /// Local IP of the resolved named route.
    pub fn local_ip(&self, route_key: &str) -> String {
        self.resolve(route_key).local_ip
    }

    /// Location of the backing storage, for logs.
    pub fn location(&self) -> String {
        self.storage.location()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, RoutingDocument> {
        self.document.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, RoutingDocument> {
        self.document.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for RouteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteStore")
            .field("location", &self.storage.location())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::document::{ProxySpec, Route, DEFAULT_LOCAL_IP};
    use crate::routing::storage::{MemoryStorage, StorageError};
    use serde_json::json;

    fn store_from(value: serde_json::Value) -> (Arc<MemoryStorage>, RouteStore) {
        let doc: RoutingDocument = serde_json::from_value(value).unwrap();
        let storage = Arc::new(MemoryStorage::new(doc));
        let store = RouteStore::open(storage.clone()).unwrap();
        (storage, store)
    }

    #[test]
    fn test_open_requires_document() {
        let err = RouteStore::open(Arc::new(MemoryStorage::empty())).unwrap_err();
        assert!(matches!(err, StorageError::Missing(_)));
    }

    #[test]
    fn test_resolve_named_then_default_then_zeroed() {
        let (_, store) = store_from(json!({
            "default": { "localIp": "10.0.0.1", "proxy": { "protocol": "http", "host": "d", "port": 3128 } },
            "routes": { "eu": { "localIp": "10.0.0.2", "proxy": { "protocol": "socks5", "host": "eu", "port": 1080 } } }
        }));

        let eu = store.resolve("eu");
        assert_eq!(eu.local_ip, "10.0.0.2");
        assert_eq!(eu.proxy.host, "eu");

        let fallback = store.resolve("us");
        assert_eq!(fallback.local_ip, "10.0.0.1");
        assert_eq!(fallback.proxy.host, "d");

        let (_, bare) = store_from(json!({}));
        assert_eq!(bare.resolve("eu"), ResolvedRoute::zeroed());
        assert_eq!(bare.local_ip("eu"), DEFAULT_LOCAL_IP);
    }

    #[test]
    fn test_resolve_by_wallet_is_case_insensitive() {
        let (_, store) = store_from(json!({
            "default": { "proxy": {} },
            "wallets": { "0xaa": { "proxy": { "protocol": "http", "host": "p.example", "port": 8080 } } }
        }));

        let hit = store.resolve_by_wallet(Some("0xAA"));
        assert_eq!(hit.proxy, ProxySpec::new("http", "p.example", 8080));
        assert_eq!(hit.local_ip, DEFAULT_LOCAL_IP);

        let miss = store.resolve_by_wallet(Some("0xbb"));
        assert!(miss.proxy.is_direct());
    }

    #[test]
    fn test_resolve_by_wallet_empty_address_uses_default() {
        let (_, store) = store_from(json!({
            "default": { "proxy": { "protocol": "socks5", "host": "d", "port": 1080 } },
            "routes": { "default": { "proxy": { "host": "named-default", "port": 1 } } }
        }));

        assert_eq!(store.resolve_by_wallet(None), store.resolve(DEFAULT_ROUTE_KEY));
        assert_eq!(store.resolve_by_wallet(Some("")).proxy.host, "named-default");
    }

    #[test]
    fn test_refresh_picks_up_external_writes() {
        let (storage, store) = store_from(json!({}));
        assert!(store.resolve_by_wallet(Some("0xaa")).proxy.is_direct());

        let mut doc = RoutingDocument::default();
        doc.wallets.insert("0xaa".into(), Route::proxy_only(ProxySpec::new("http", "h", 80)));
        storage.save(&doc).unwrap();

        // Stale until refreshed
        assert!(store.resolve_by_wallet(Some("0xaa")).proxy.is_direct());
        store.refresh().unwrap();
        assert_eq!(store.resolve_by_wallet(Some("0xaa")).proxy.host, "h");
    }
}
