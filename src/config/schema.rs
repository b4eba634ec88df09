//! Service configuration schema.
//!
//! This module defines the settings of the router service itself (listener,
//! routing document location, outbound dispatch, relayer, admin API and
//! observability). The routing document has its own schema in
//! `routing::document`.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the wallet proxy router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where the routing document lives.
    pub store: StoreConfig,

    /// Outbound HTTP client settings.
    pub dispatch: DispatchConfig,

    /// Upstream relayer settings.
    pub relayer: RelayerConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:4000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:4000".to_string(),
        }
    }
}

/// Routing document location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON routing document.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "ip-config.json".to_string(),
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// TCP connect timeout in seconds (to the proxy, or the target when direct).
    pub connect_timeout_secs: u64,

    /// Whole-request timeout applied when the caller supplies none.
    /// `None` leaves requests unbounded.
    pub default_timeout_secs: Option<u64>,

    /// User-Agent sent on outbound requests.
    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            default_timeout_secs: None,
            user_agent: concat!("wallet-proxy-router/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Upstream relayer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayerConfig {
    /// Base URL of the relayer.
    pub url: String,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            url: "https://relayer-v2.polymarket.com/".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Require owner/wallet addresses to be 20-byte hex EVM addresses.
    pub strict_addresses: bool,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            strict_addresses: false,
            max_body_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
