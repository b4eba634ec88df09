//! Owner/wallet authorization model and configuration mutations.
//!
//! # Responsibilities
//! - Map owners to the wallets they control
//! - Answer `is_owned_by`, the only authorization fact in the system
//! - Upsert/remove wallet proxies and replace owner rosters
//!
//! # Design Decisions
//! - Every operation refreshes from storage first; the in-memory copy is
//!   never trusted across requests
//! - Mutations load the document under the writer lock, patch one section
//!   of that copy and save the whole document
//! - Mutations inside one process are serialized by a writer lock; writers in
//!   other processes still race last-writer-wins
//! - Ownership and wallet proxies are independent sections: touching one never
//!   edits the other
//! - Empty identifiers make mutations a no-op, not an error
//! - Mutations do not check ownership; callers gate them with `is_owned_by`

use std::sync::{Arc, Mutex, MutexGuard};

use crate::observability::metrics;
use crate::routing::document::{normalize_address, ProxySpec, Route, WalletProxy};
use crate::routing::storage::StorageResult;
use crate::routing::store::RouteStore;

/// Configuration service wrapping a `RouteStore`.
#[derive(Debug)]
pub struct ConfigService {
    store: Arc<RouteStore>,
    writer: Mutex<()>,
}

impl ConfigService {
    pub fn new(store: Arc<RouteStore>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// Underlying route store (shared with the relay bridge).
    pub fn store(&self) -> &Arc<RouteStore> {
        &self.store
    }

    /// Every configured wallet with its proxy.
    pub fn list_all(&self) -> StorageResult<Vec<WalletProxy>> {
        let doc = self.store.load_fresh()?;
        Ok(doc
            .wallets
            .into_iter()
            .map(|(address, route)| WalletProxy {
                address,
                proxy: route.proxy,
            })
            .collect())
    }

    /// Resolve each address in input order.
    ///
    /// Unknown addresses get the default (or zeroed) proxy; duplicates are kept.
    pub fn list_by_addresses<S: AsRef<str>>(&self, addresses: &[S]) -> StorageResult<Vec<WalletProxy>> {
        self.store.refresh()?;
        Ok(self.resolve_all(addresses))
    }

    /// Wallets controlled by `owner`, each with its resolved proxy.
    pub fn get_by_owner(&self, owner: &str) -> StorageResult<Vec<WalletProxy>> {
        let wallets = self.owner_wallets(owner)?;
        Ok(self.resolve_all(&wallets))
    }

    /// Lower-cased wallet list of `owner`; empty for unknown or empty owners.
    pub fn owner_wallets(&self, owner: &str) -> StorageResult<Vec<String>> {
        let owner = normalize_address(owner);
        if owner.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .store
            .load_fresh()?
            .owners
            .remove(&owner)
            .unwrap_or_default())
    }

    /// True iff `wallet` is listed under `owner`.
    pub fn is_owned_by(&self, owner: &str, wallet: &str) -> StorageResult<bool> {
        let wallet = normalize_address(wallet);
        if wallet.is_empty() || normalize_address(owner).is_empty() {
            return Ok(false);
        }
        let owned = self.owner_wallets(owner)?.contains(&wallet);
        tracing::debug!(owner = %owner, wallet = %wallet, owned, "Ownership check");
        Ok(owned)
    }

    /// Replace `owner`'s wallet list wholesale.
    pub fn update_owner<S: AsRef<str>>(&self, owner: &str, wallets: &[S]) -> StorageResult<()> {
        let owner = normalize_address(owner);
        if owner.is_empty() {
            return Ok(());
        }
        let wallets: Vec<String> = wallets.iter().map(|w| normalize_address(w.as_ref())).collect();

        let _writer = self.writer();
        let mut next = self.store.load_fresh()?;
        tracing::info!(owner = %owner, wallets = wallets.len(), "Updating owner wallet list");
        next.owners.insert(owner, wallets);
        self.store.commit(next)?;
        metrics::record_mutation("update_owner");
        Ok(())
    }

    /// Replace the proxy entry of `address`.
    pub fn update_wallet(&self, address: &str, proxy: ProxySpec) -> StorageResult<()> {
        let address = normalize_address(address);
        if address.is_empty() {
            return Ok(());
        }

        let _writer = self.writer();
        let mut next = self.store.load_fresh()?;
        tracing::info!(
            wallet = %address,
            protocol = %proxy.protocol,
            host = %proxy.host,
            port = proxy.port,
            "Updating wallet proxy"
        );
        next.wallets.insert(address, Route::proxy_only(proxy));
        self.store.commit(next)?;
        metrics::record_mutation("update_wallet");
        Ok(())
    }

    /// Delete the proxy entry of `address`. Returns whether anything was removed.
    ///
    /// Nothing is written when the entry does not exist.
    pub fn remove_wallet(&self, address: &str) -> StorageResult<bool> {
        let address = normalize_address(address);
        if address.is_empty() {
            return Ok(false);
        }

        let _writer = self.writer();
        let mut next = self.store.load_fresh()?;
        if next.wallets.remove(&address).is_none() {
            tracing::debug!(wallet = %address, "No proxy entry to remove");
            return Ok(false);
        }
        tracing::info!(wallet = %address, "Removing wallet proxy");
        self.store.commit(next)?;
        metrics::record_mutation("remove_wallet");
        Ok(true)
    }

    /// Upsert every item's proxy and make the items the owner's full roster.
    ///
    /// Items without an address are skipped. Wallets dropped from the roster
    /// keep their proxy entry.
    pub fn batch_sync(&self, owner: &str, items: &[WalletProxy]) -> StorageResult<()> {
        let owner = normalize_address(owner);
        if owner.is_empty() {
            return Ok(());
        }

        let _writer = self.writer();
        let mut next = self.store.load_fresh()?;

        let mut roster: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            let address = normalize_address(&item.address);
            if address.is_empty() {
                continue;
            }
            next.wallets.insert(address.clone(), Route::proxy_only(item.proxy.clone()));
            if !roster.contains(&address) {
                roster.push(address);
            }
        }

        tracing::info!(owner = %owner, wallets = roster.len(), "Batch syncing owner wallets");
        next.owners.insert(owner, roster);
        self.store.commit(next)?;
        metrics::record_mutation("batch_sync");
        Ok(())
    }

    fn resolve_all<S: AsRef<str>>(&self, addresses: &[S]) -> Vec<WalletProxy> {
        addresses
            .iter()
            .map(|address| {
                let address = address.as_ref();
                WalletProxy {
                    address: address.to_string(),
                    proxy: self.store.resolve_by_wallet(Some(address)).proxy,
                }
            })
            .collect()
    }

    fn writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
