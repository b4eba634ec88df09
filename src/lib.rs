//! Wallet Proxy Router Library
//!
//! Resolves, per wallet address, which outbound proxy (if any) HTTP calls
//! should go through, and manages which owner controls which wallets.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod routing;

pub use config::ServiceConfig;
pub use dispatch::{build_proxy_url, OutboundRequest, ProxyDispatcher, Transport};
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
pub use relay::RelayBridge;
pub use routing::{ConfigService, ProxySpec, RouteStore, RoutingDocument, WalletProxy};
