//! Routing subsystem: which proxy a wallet (or named route) goes out through,
//! and who may change it.
//!
//! # Data Flow
//! ```text
//! Lookup:
//!     wallet address / route key
//!     → store.rs (refresh, then wallets[addr] | routes[key] → default → zeroed)
//!     → ResolvedRoute { localIp, proxy }
//!
//! Mutation:
//!     owner + wallet(s) + proxy
//!     → service.rs (refresh → clone → patch one section)
//!     → storage.rs (save whole document)
//! ```
//!
//! # Design Decisions
//! - One JSON document is the source of truth; no partial writes
//! - Addresses are lower-cased before every store and lookup
//! - `owners[X]` containing `A` is the only authorization fact

pub mod document;
pub mod service;
pub mod storage;
pub mod store;

pub use document::{
    normalize_address, ProxySpec, ResolvedRoute, Route, RoutingDocument, WalletProxy,
    DEFAULT_LOCAL_IP,
};
pub use service::ConfigService;
pub use storage::{ConfigStorage, FileStorage, MemoryStorage, StorageError, StorageResult};
pub use store::{RouteStore, DEFAULT_ROUTE_KEY};
