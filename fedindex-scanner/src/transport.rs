//! Per-request routing between the direct network and a SOCKS proxy
//! (typically a local Tor daemon).

use crate::error::{FetchError, Result, ScanError};
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::debug;

/// Upper bound on one request, on either route.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Where a local Tor daemon listens by default.
pub const DEFAULT_TOR_PROXY: &str = "127.0.0.1:9050";

pub const USER_AGENT: &str = concat!("fedindex/", env!("CARGO_PKG_VERSION"), " (instance-index-scan)");

const ONION_TLD: &str = ".onion";

/// Run-scoped routing configuration. Fixed once the router is built.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Proxy endpoint, either a full URL (`socks5h://host:port`) or a bare
    /// `host:port`.
    pub proxy: Option<String>,
    /// Send every request through the proxy.
    pub force_proxy: bool,
    /// Whether `.onion` hosts may be crawled at all.
    pub onion_routing: bool,
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            force_proxy: false,
            onion_routing: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Proxied,
}

/// A checked-out client for one request.
///
/// `reqwest::Client` is a handle onto a shared connection pool, so holding a
/// clone is the checkout and dropping it is the return, whichever way the
/// request ends.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    route: Route,
    client: Client,
}

impl ClientHandle {
    pub fn route(&self) -> Route {
        self.route
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Debug)]
pub struct TransportRouter {
    config: TransportConfig,
    direct: Client,
    proxied: Option<Client>,
}

impl TransportRouter {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let direct = base_client_builder(config.request_timeout)
            .no_proxy()
            .build()?;

        let proxied = match config.proxy.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() => {
                let proxy_url = normalize_proxy_url(addr);
                let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                    ScanError::Configuration(format!("invalid proxy '{}': {}", addr, e))
                })?;
                debug!("Proxied route enabled via {}", proxy_url);
                Some(
                    base_client_builder(config.request_timeout)
                        .proxy(proxy)
                        .build()?,
                )
            }
            _ => None,
        };

        Ok(Self {
            config: config.clone(),
            direct,
            proxied,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn has_proxy(&self) -> bool {
        self.proxied.is_some()
    }

    /// Decide the route for `host`. Depends only on `host` and the
    /// configuration the router was built with.
    pub fn route_for(&self, host: &str) -> std::result::Result<Route, FetchError> {
        let onion = is_onion_host(host);
        if onion && !self.config.onion_routing {
            return Err(FetchError::Configuration(format!(
                "{} is an onion host but onion routing is disabled",
                host
            )));
        }

        let route = if onion || self.config.force_proxy {
            Route::Proxied
        } else {
            Route::Direct
        };

        if route == Route::Proxied && self.proxied.is_none() {
            return Err(missing_proxy(host));
        }

        Ok(route)
    }

    pub fn select_client(&self, host: &str) -> std::result::Result<ClientHandle, FetchError> {
        let route = self.route_for(host)?;
        let client = match route {
            Route::Direct => self.direct.clone(),
            Route::Proxied => self.proxied.clone().ok_or_else(|| missing_proxy(host))?,
        };
        Ok(ClientHandle { route, client })
    }
}

fn missing_proxy(host: &str) -> FetchError {
    FetchError::Configuration(format!(
        "routing {} requires proxy but none configured",
        host
    ))
}

fn base_client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        // fetch_relations follows redirects itself so each hop is routed.
        .redirect(reqwest::redirect::Policy::none())
}

/// `host:port` becomes `socks5h://host:port` so names (onion names in
/// particular) are resolved by the proxy.
pub fn normalize_proxy_url(addr: &str) -> String {
    let addr = addr.trim();
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("socks5h://{}", addr)
    }
}

pub fn is_onion_host(host: &str) -> bool {
    let host = host.trim_end_matches('.');
    host.len() > ONION_TLD.len()
        && host
            .get(host.len() - ONION_TLD.len()..)
            .is_some_and(|tld| tld.eq_ignore_ascii_case(ONION_TLD))
}
