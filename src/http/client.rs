//! DSL transport with retry and rate limiting
//!
//! [`DslClient`] issues authenticated requests to the search endpoint and
//! returns raw pages. It is the only component that touches the network:
//! page fetches from the pagination engine and scoped lookups from lazy
//! field expansion both funnel through [`DslClient::fetch_page`], so every
//! request passes the rate limiter and the page cache exactly once.
//!
//! Retry policy per error class:
//! - throttling (429): back off exponentially and retry transparently up to
//!   a bound, then surface [`Error::Throttled`]
//! - transient connectivity: a small fixed number of retries with a short
//!   fixed delay, then [`Error::Network`]
//! - auth failures (401/403): surfaced immediately, never retried
//! - server errors (5xx): surfaced immediately; retrying burns quota

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{Authenticator, CredentialProvider};
use crate::cache::{CacheStats, PageCache, PageKey};
use crate::error::{Error, Result};
use crate::pagination::Page;
use crate::query::Query;
use crate::types::JsonValue;
use reqwest::{Client, Response, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest result window the server accepts per request
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Configuration for the DSL client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service (scheme + host)
    pub base_url: String,
    /// Path of the DSL search endpoint
    pub dsl_path: String,
    /// Path of the login endpoint
    pub auth_path: String,
    /// Result window size per request, capped at [`MAX_PAGE_SIZE`]
    pub page_size: u32,
    /// Request timeout
    pub timeout: Duration,
    /// Retries for transient connectivity failures
    pub network_retries: u32,
    /// Fixed delay between connectivity retries
    pub network_retry_delay: Duration,
    /// Attempts allowed for a single call while being throttled
    pub throttle_retries: u32,
    /// Rate limiter configuration
    pub rate_limit: RateLimiterConfig,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.dimensions.ai".to_string(),
            dsl_path: "/api/dsl.json".to_string(),
            auth_path: "/api/auth.json".to_string(),
            page_size: MAX_PAGE_SIZE,
            timeout: Duration::from_secs(30),
            network_retries: 3,
            network_retry_delay: Duration::from_millis(500),
            throttle_retries: 5,
            rate_limit: RateLimiterConfig::default(),
            user_agent: format!("dimensional/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    fn dsl_url(&self) -> String {
        join_url(&self.base_url, &self.dsl_path)
    }

    fn auth_url(&self) -> String {
        join_url(&self.base_url, &self.auth_path)
    }
}

/// Builder for client config
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the result window size (capped at [`MAX_PAGE_SIZE`])
    pub fn page_size(mut self, size: u32) -> Self {
        self.config.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set connectivity retry behavior
    pub fn network_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.config.network_retries = retries;
        self.config.network_retry_delay = delay;
        self
    }

    /// Set the throttle retry bound
    pub fn throttle_retries(mut self, retries: u32) -> Self {
        self.config.throttle_retries = retries;
        self
    }

    /// Set the rate limiter configuration
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Authenticated transport plus the session-scoped cache and rate limiter
pub struct DslClient {
    http: Client,
    config: ClientConfig,
    authenticator: Authenticator,
    limiter: RateLimiter,
    cache: PageCache,
    debug: AtomicBool,
}

impl DslClient {
    /// Create a client from config and an injected credential provider
    pub fn new(config: ClientConfig, provider: Arc<dyn CredentialProvider>) -> Result<Self> {
        url::Url::parse(&config.base_url)?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        let authenticator = Authenticator::new(config.auth_url(), provider, http.clone());
        let limiter = RateLimiter::new(config.rate_limit.clone());

        Ok(Self {
            http,
            config,
            authenticator,
            limiter,
            cache: PageCache::new(),
            debug: AtomicBool::new(false),
        })
    }

    /// Obtain a token now, surfacing credential problems before any query
    pub async fn authenticate(&self) -> Result<()> {
        self.authenticator.token().await.map(|_| ())
    }

    /// The configured result window size
    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    /// Toggle verbose per-request tracing
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    /// Snapshot of the session cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The session rate limiter
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Fetch one result window, read-through cached.
    ///
    /// A cache hit short-circuits network I/O entirely; a miss goes through
    /// the rate limiter and stores the fetched page before returning it.
    pub async fn fetch_page(&self, query: &Query, offset: u32, limit: u32) -> Result<Arc<Page>> {
        let key = PageKey::new(query.raw(), offset, limit);
        if let Some(page) = self.cache.get(&key) {
            return Ok(page);
        }

        let page = Arc::new(self.fetch_remote(query, offset, limit).await?);
        self.cache.put(key, Arc::clone(&page));
        Ok(page)
    }

    /// Issue one DSL request, handling retries for transient failures
    async fn fetch_remote(&self, query: &Query, offset: u32, limit: u32) -> Result<Page> {
        let url = self.config.dsl_url();
        let body = format!("{} limit {} skip {}", query.raw(), limit, offset);

        let mut network_attempts = 0u32;
        let mut throttle_attempts = 0u32;

        loop {
            self.limiter.admit().await?;
            let token = self.authenticator.token().await?;

            if self.debug.load(Ordering::Relaxed) {
                debug!(%url, offset, limit, query = query.raw(), "issuing DSL request");
            }

            let result = self
                .http
                .post(&url)
                .header("Authorization", format!("JWT {token}"))
                .header("Content-Type", "application/json")
                .body(body.clone())
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    network_attempts += 1;
                    if network_attempts > self.config.network_retries {
                        return Err(Error::network(format!(
                            "request failed after {network_attempts} attempts: {e}"
                        )));
                    }
                    warn!(
                        attempt = network_attempts,
                        max = self.config.network_retries,
                        "transient network error, retrying: {e}"
                    );
                    tokio::time::sleep(self.config.network_retry_delay).await;
                    continue;
                }
                Err(e) => return Err(Error::network(e.to_string())),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = extract_retry_after(&response);
                throttle_attempts += 1;
                if throttle_attempts > self.config.throttle_retries {
                    return Err(Error::Throttled {
                        retry_after_seconds: retry_after.map(|d| d.as_secs()),
                    });
                }
                let delay = self.limiter.note_throttled(retry_after);
                warn!(
                    attempt = throttle_attempts,
                    max = self.config.throttle_retries,
                    delay_ms = delay.as_millis() as u64,
                    "throttled, backing off and retrying"
                );
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(Error::auth(format!(
                    "request rejected with status {}",
                    status.as_u16()
                )));
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::server(status.as_u16(), body));
            }

            self.limiter
                .record_response(quota_remaining(&response), quota_reset(&response));

            let json: JsonValue = response
                .json()
                .await
                .map_err(|e| Error::parse(format!("response body: {e}")))?;

            let page = parse_page(query, offset, limit, &json)?;

            if self.debug.load(Ordering::Relaxed) {
                debug!(
                    offset,
                    items = page.items.len(),
                    total = page.total_count,
                    "DSL response parsed"
                );
            }

            return Ok(page);
        }
    }
}

impl std::fmt::Debug for DslClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DslClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Assemble a [`Page`] from a raw response body.
///
/// The wire schema belongs to the remote service, so parsing is defensive:
/// a missing entity array is treated as empty, a missing `_stats.total_count`
/// falls back to what this window proves exists.
fn parse_page(query: &Query, offset: u32, limit: u32, body: &JsonValue) -> Result<Page> {
    let object = body
        .as_object()
        .ok_or_else(|| Error::parse("response body is not a JSON object"))?;

    let items: Vec<_> = match object.get(query.result_type().keyword()) {
        Some(JsonValue::Array(entries)) => entries
            .iter()
            .filter_map(|entry| entry.as_object().cloned())
            .collect(),
        Some(_) => {
            return Err(Error::parse(format!(
                "'{}' field is not an array",
                query.result_type().keyword()
            )))
        }
        None => Vec::new(),
    };

    let total_count = object
        .get("_stats")
        .and_then(|stats| stats.get("total_count"))
        .and_then(JsonValue::as_u64)
        .unwrap_or(offset as u64 + items.len() as u64);

    Ok(Page {
        offset,
        limit,
        total_count,
        items,
    })
}

/// Extract the Retry-After header value, when present and parseable
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

fn quota_remaining(response: &Response) -> Option<u32> {
    response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

fn quota_reset(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
