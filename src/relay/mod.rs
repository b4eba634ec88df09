//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! (request, wallet address | route key)
//!     → RouteStore refresh + resolve
//!     → ProxyDispatcher::fetch_via_proxy
//!     → upstream Response
//! ```

pub mod bridge;

pub use bridge::{RelayBridge, RelayError, RelayResult};
