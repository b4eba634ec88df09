//! Proxy-selecting HTTP dispatch.
//!
//! # Responsibilities
//! - Pick a transport from a proxy descriptor (direct / HTTP proxy / SOCKS)
//! - Keep one HTTP client per distinct transport
//! - Issue the request and hand back the raw response
//!
//! # Design Decisions
//! - SOCKS and HTTP-forward proxies need different handshakes, so they get
//!   separate clients even when pointed at the same host
//! - HTTP proxies tunnel TLS targets with CONNECT and forward plain HTTP
//! - Direct clients ignore proxy environment variables
//! - No retries; the deadline is whatever the caller supplies (or the
//!   configured default)

use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, Proxy, Response};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::DispatchConfig;
use crate::dispatch::proxy_url::{build_proxy_url, redacted_proxy_url};
use crate::observability::metrics;
use crate::routing::ProxySpec;

/// Errors surfaced by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Target URL could not be parsed.
    #[error("invalid target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Proxy descriptor could not be turned into a client.
    #[error("invalid proxy '{proxy}': {source}")]
    InvalidProxy {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    /// Network failure (DNS, connect, proxy auth, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Caller cancelled the request before it completed.
    #[error("request cancelled")]
    Cancelled,
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// How an outbound request leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// No proxy.
    Direct,
    /// HTTP forward proxy (CONNECT for TLS targets).
    HttpProxy { url: String },
    /// SOCKS4/5 tunnel.
    Socks { url: String },
}

impl Transport {
    /// Choose the transport for `proxy`.
    ///
    /// Any protocol starting with `socks` tunnels over SOCKS; everything else
    /// (including an empty protocol) is treated as an HTTP proxy.
    pub fn select(proxy: &ProxySpec) -> Self {
        let url = build_proxy_url(proxy);
        if url.is_empty() {
            return Transport::Direct;
        }
        if proxy.protocol.to_ascii_lowercase().starts_with("socks") {
            Transport::Socks { url }
        } else {
            Transport::HttpProxy { url }
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Transport::Direct => "direct",
            Transport::HttpProxy { .. } => "http_proxy",
            Transport::Socks { .. } => "socks",
        }
    }
}

/// Generic outbound HTTP request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Whole-request deadline; falls back to the dispatcher default.
    pub timeout: Option<Duration>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP client front that routes each request through the right transport.
pub struct ProxyDispatcher {
    config: DispatchConfig,
    direct: Client,
    tunneled: DashMap<String, Client>,
}

impl ProxyDispatcher {
    /// Create a dispatcher with the given client settings.
    pub fn new(config: DispatchConfig) -> DispatchResult<Self> {
        let direct = base_builder(&config).no_proxy().build()?;
        Ok(Self {
            config,
            direct,
            tunneled: DashMap::new(),
        })
    }

    /// Client for `transport`, built on first use and reused afterwards.
    pub fn client_for(&self, transport: &Transport) -> DispatchResult<Client> {
        let url = match transport {
            Transport::Direct => return Ok(self.direct.clone()),
            Transport::HttpProxy { url } | Transport::Socks { url } => url,
        };

        if let Some(client) = self.tunneled.get(url) {
            return Ok(client.clone());
        }

        let invalid = |source| DispatchError::InvalidProxy {
            proxy: transport.label().to_string(),
            source,
        };
        let proxy = Proxy::all(url.as_str()).map_err(invalid)?;
        let client = base_builder(&self.config).proxy(proxy).build().map_err(invalid)?;
        self.tunneled.insert(url.clone(), client.clone());
        Ok(client)
    }

    /// Number of cached proxied clients.
    pub fn cached_clients(&self) -> usize {
        self.tunneled.len()
    }

    /// Issue `request` through the transport selected for `proxy`.
    pub async fn fetch_via_proxy(
        &self,
        request: OutboundRequest,
        proxy: &ProxySpec,
    ) -> DispatchResult<Response> {
        let target = Url::parse(&request.url).map_err(|source| DispatchError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;

        let transport = Transport::select(proxy);
        let client = self.client_for(&transport)?;

        tracing::debug!(
            method = %request.method,
            target = %target,
            transport = transport.label(),
            proxy = %redacted_proxy_url(proxy),
            "Dispatching outbound request"
        );

        let mut builder = client.request(request.method, target).headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let timeout = request
            .timeout
            .or(self.config.default_timeout_secs.map(Duration::from_secs));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        metrics::record_dispatch(transport.label());
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(transport = transport.label(), error = %e, "Outbound request failed");
            DispatchError::Transport(e)
        })?;
        Ok(response)
    }

    /// Like `fetch_via_proxy`, abandoning the request once `cancel` resolves.
    pub async fn fetch_via_proxy_until<C>(
        &self,
        request: OutboundRequest,
        proxy: &ProxySpec,
        cancel: C,
    ) -> DispatchResult<Response>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.fetch_via_proxy(request, proxy) => result,
            _ = cancel => Err(DispatchError::Cancelled),
        }
    }
}

impl std::fmt::Debug for ProxyDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyDispatcher")
            .field("config", &self.config)
            .field("cached_clients", &self.tunneled.len())
            .finish()
    }
}

fn base_builder(config: &DispatchConfig) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(config.user_agent.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_direct() {
        assert_eq!(Transport::select(&ProxySpec::default()), Transport::Direct);
        assert_eq!(Transport::select(&ProxySpec::new("socks5", "", 1080)), Transport::Direct);
    }

    #[test]
    fn test_select_socks_variants() {
        for protocol in ["socks4", "socks5", "SOCKS5", "socks5h"] {
            let transport = Transport::select(&ProxySpec::new(protocol, "h", 1080));
            assert_eq!(transport.label(), "socks", "protocol {}", protocol);
        }
    }

    #[test]
    fn test_select_http_variants() {
        for protocol in ["http", "https", ""] {
            let transport = Transport::select(&ProxySpec::new(protocol, "h", 3128));
            assert_eq!(transport.label(), "http_proxy", "protocol {:?}", protocol);
        }
        assert_eq!(
            Transport::select(&ProxySpec::new("", "h", 3128)),
            Transport::HttpProxy {
                url: "http://h:3128".into()
            }
        );
    }

    #[tokio::test]
    async fn test_clients_are_cached_per_transport() {
        let dispatcher = ProxyDispatcher::new(DispatchConfig::default()).unwrap();
        let http = Transport::select(&ProxySpec::new("http", "127.0.0.1", 3128));
        let socks = Transport::select(&ProxySpec::new("socks5", "127.0.0.1", 3128));

        dispatcher.client_for(&http).unwrap();
        dispatcher.client_for(&http).unwrap();
        dispatcher.client_for(&Transport::Direct).unwrap();
        assert_eq!(dispatcher.cached_clients(), 1);

        dispatcher.client_for(&socks).unwrap();
        assert_eq!(dispatcher.cached_clients(), 2);
    }

    #[tokio::test]
    async fn test_invalid_target_url() {
        let dispatcher = ProxyDispatcher::new(DispatchConfig::default()).unwrap();
        let err = dispatcher
            .fetch_via_proxy(OutboundRequest::get("not a url"), &ProxySpec::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_cancellation() {
        let dispatcher = ProxyDispatcher::new(DispatchConfig::default()).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and never answer
        tokio::spawn(async move {
            let _held = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let err = dispatcher
            .fetch_via_proxy_until(
                OutboundRequest::get(format!("http://{}/", addr)),
                &ProxySpec::default(),
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Cancelled));
    }
}
