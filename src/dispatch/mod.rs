//! Outbound dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! ProxySpec
//!     → proxy_url.rs (scheme://[user:pass@]host:port, or "" for direct)
//!     → dispatcher.rs (Transport::select → cached reqwest client)
//!     → send request → raw Response (or DispatchError)
//! ```

pub mod dispatcher;
pub mod proxy_url;

pub use dispatcher::{DispatchError, DispatchResult, OutboundRequest, ProxyDispatcher, Transport};
pub use proxy_url::{build_proxy_url, redacted_proxy_url};
