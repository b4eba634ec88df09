//! Configuration Document schema.
//!
//! # Responsibilities
//! - Define the persisted address → proxy document (default, routes, wallets, owners)
//! - Tolerate missing sections and fields (serde defaults, never ad hoc checks)
//! - Normalize wallet and owner addresses to lower case
//!
//! # Design Decisions
//! - Sections absent from disk deserialize to empty maps
//! - Unknown top-level sections are carried through untouched so whole-document
//!   writes never drop data this crate does not understand
//! - A proxy with an empty host or a zero port means "connect directly"

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Local IP reported for routes that do not set one.
pub const DEFAULT_LOCAL_IP: &str = "127.0.0.1";

/// Normalize a wallet or owner address for storage and lookup.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Root of the persisted routing configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingDocument {
    /// Fallback route when nothing more specific exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Route>,

    /// Named, non-wallet-specific proxy profiles.
    pub routes: BTreeMap<String, Route>,

    /// Lower-cased wallet address → route carrying only a proxy.
    pub wallets: BTreeMap<String, Route>,

    /// Lower-cased owner address → lower-cased wallets it controls.
    pub owners: BTreeMap<String, Vec<String>>,

    /// Sections not modelled here, preserved on write.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A local IP + proxy pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Route {
    #[serde(rename = "localIp", skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,

    pub proxy: ProxySpec,
}

impl Route {
    /// Wallet entries only ever carry a proxy.
    pub fn proxy_only(proxy: ProxySpec) -> Self {
        Self {
            local_ip: None,
            proxy,
        }
    }
}

/// Proxy descriptor: protocol, endpoint and credentials.
///
/// Every field defaults to empty/zero, which is how a partially specified
/// proxy is normalized on the way in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxySpec {
    /// `http`, `https`, `socks4`, `socks5` or empty.
    #[serde(deserialize_with = "string_or_null")]
    pub protocol: String,

    #[serde(deserialize_with = "string_or_null")]
    pub host: String,

    #[serde(deserialize_with = "port_number_or_string")]
    pub port: u16,

    #[serde(deserialize_with = "string_or_null")]
    pub username: String,

    #[serde(deserialize_with = "string_or_null")]
    pub password: String,
}

impl ProxySpec {
    /// Convenience constructor without credentials.
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Attach basic credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// True when the descriptor means "no proxy".
    pub fn is_direct(&self) -> bool {
        self.host.is_empty() || self.port == 0
    }
}

/// Route as handed to callers after fallback resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    #[serde(rename = "localIp")]
    pub local_ip: String,
    pub proxy: ProxySpec,
}

impl ResolvedRoute {
    /// The zeroed route: loopback, no proxy.
    pub fn zeroed() -> Self {
        Self {
            local_ip: DEFAULT_LOCAL_IP.to_string(),
            proxy: ProxySpec::default(),
        }
    }

    pub(crate) fn from_route(route: Option<&Route>) -> Self {
        match route {
            Some(route) => Self {
                local_ip: route
                    .local_ip
                    .as_deref()
                    .filter(|ip| !ip.is_empty())
                    .unwrap_or(DEFAULT_LOCAL_IP)
                    .to_string(),
                proxy: route.proxy.clone(),
            },
            None => Self::zeroed(),
        }
    }
}

/// One wallet together with its resolved proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletProxy {
    pub address: String,
    pub proxy: ProxySpec,
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ports arrive as numbers, numeric strings, empty strings or null.
///
/// Anything that is not a valid port number degrades to `0` (direct) for this
/// entry alone, so one bad value never makes the whole document unloadable.
fn port_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let port = match &raw {
        Value::Null => Some(0),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u16::try_from(n).ok()),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };

    Ok(port.unwrap_or_else(|| {
        tracing::warn!(port = %raw, "Ignoring invalid proxy port, treating entry as direct");
        0
    }))
}
