//! Proxy URL construction.

use crate::routing::ProxySpec;

/// Scheme used when a proxy does not name one.
pub const DEFAULT_PROXY_SCHEME: &str = "http";

/// Build `scheme://[user:pass@]host:port` for `proxy`.
///
/// Returns an empty string for a direct (proxy-less) descriptor. Credentials
/// are percent-encoded and only emitted when a username is set.
pub fn build_proxy_url(proxy: &ProxySpec) -> String {
    if proxy.is_direct() {
        return String::new();
    }

    let scheme = if proxy.protocol.is_empty() {
        DEFAULT_PROXY_SCHEME
    } else {
        proxy.protocol.as_str()
    };

    let auth = if proxy.username.is_empty() {
        String::new()
    } else {
        format!(
            "{}:{}@",
            urlencoding::encode(&proxy.username),
            urlencoding::encode(&proxy.password)
        )
    };

    format!("{}://{}{}:{}", scheme, auth, proxy.host, proxy.port)
}

/// Same URL with the password masked, for logs.
pub fn redacted_proxy_url(proxy: &ProxySpec) -> String {
    let url = build_proxy_url(proxy);
    if proxy.username.is_empty() || proxy.password.is_empty() {
        return url;
    }
    let secret = format!(":{}@", urlencoding::encode(&proxy.password));
    url.replacen(&secret, ":***@", 1)
}
