//! Session façade
//!
//! [`Session`] is the single entry point: it owns the transport, the page
//! cache, and the rate limiter, and turns a search string into a total
//! count plus a lazy stream of typed records. One session amortizes its
//! token and cache across every query run through it.

use crate::auth::{CredentialProvider, StaticCredentials};
use crate::cache::CacheStats;
use crate::error::Result;
use crate::http::{ClientConfig, DslClient};
use crate::pagination::Pages;
use crate::query::Query;
use crate::record::{self, Record};
use crate::types::{JsonObject, ResultType};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// An authenticated connection to the search service
#[derive(Debug, Clone)]
pub struct Session {
    client: Arc<DslClient>,
}

impl Session {
    /// Start building a session
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Create a session with username/password credentials and defaults
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::builder().login(username, password).build()
    }

    /// Obtain a token now instead of on the first query.
    ///
    /// Useful to surface bad credentials early; otherwise authentication
    /// happens lazily when the first request needs a token.
    pub async fn authenticate(&self) -> Result<()> {
        self.client.authenticate().await
    }

    /// Run a search, returning the total match count and a lazy record
    /// stream.
    ///
    /// The query is validated before any network call. The first result
    /// window is fetched here so the total is known up front; every later
    /// window is fetched on demand as the stream is consumed. Dropping the
    /// stream early performs no further I/O.
    pub async fn query(&self, search: &str) -> Result<(u64, Records)> {
        let query = Query::parse(search)?;
        debug!(query = query.raw(), "running query");

        let mut pages = Pages::new(Arc::clone(&self.client), query.clone());
        let first = pages.next_page().await?;

        let total = pages.total_count().unwrap_or(0);
        let buffer: VecDeque<JsonObject> = first
            .map(|page| page.items.iter().cloned().collect())
            .unwrap_or_default();

        let records = Records {
            client: Arc::clone(&self.client),
            result_type: query.result_type(),
            pages,
            buffer,
            total,
            yielded: 0,
            done: false,
        };
        Ok((total, records))
    }

    /// Toggle verbose per-request tracing for this session
    pub fn set_debug(&self, enabled: bool) {
        self.client.set_debug(enabled);
    }

    /// Counters for the session page cache
    pub fn cache_stats(&self) -> CacheStats {
        self.client.cache_stats()
    }
}

/// Builder for a [`Session`]
#[derive(Default)]
pub struct SessionBuilder {
    config: ClientConfig,
    provider: Option<Arc<dyn CredentialProvider>>,
}

impl SessionBuilder {
    /// Use username/password credentials
    pub fn login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.provider = Some(Arc::new(StaticCredentials::login(username, password)));
        self
    }

    /// Use a pre-issued token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.provider = Some(Arc::new(StaticCredentials::token(token)));
        self
    }

    /// Use a custom credential provider
    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Override the service base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Replace the whole client configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the session. Fails on malformed configuration or missing
    /// credentials; no network call is made here.
    pub fn build(self) -> Result<Session> {
        let provider = self
            .provider
            .ok_or_else(|| crate::error::Error::config("no credentials configured"))?;
        let client = Arc::new(DslClient::new(self.config, provider)?);
        Ok(Session { client })
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("base_url", &self.config.base_url)
            .field("has_credentials", &self.provider.is_some())
            .finish()
    }
}

/// Lazy, fused stream of typed records for one query.
///
/// Items arrive in server rank order and each record is yielded exactly
/// once. After an error is yielded, or after the last record, every further
/// [`next`] call returns `None` without performing I/O.
///
/// [`next`]: Records::next
#[derive(Debug)]
pub struct Records {
    client: Arc<DslClient>,
    result_type: ResultType,
    pages: Pages,
    buffer: VecDeque<JsonObject>,
    total: u64,
    yielded: u64,
    done: bool,
}

impl Records {
    /// Total matching records reported by the server
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Records yielded so far
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// The entity kind this stream yields
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    /// The next record, fetching further pages on demand.
    ///
    /// Returns `Some(Err(..))` at most once; the stream is fused afterward.
    pub async fn next(&mut self) -> Option<Result<Record>> {
        if self.done {
            return None;
        }
        loop {
            if let Some(raw) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(record::materialize(&self.client, &raw, self.result_type));
            }

            match self.pages.next_page().await {
                Ok(Some(page)) => {
                    // Adopt a shrunken total reported mid-iteration
                    self.total = page.total_count;
                    self.buffer.extend(page.items.iter().cloned());
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Adapt this into a [`futures::Stream`] for combinator-style
    /// consumption.
    pub fn into_stream(self) -> impl futures::Stream<Item = Result<Record>> {
        futures::stream::unfold(self, |mut records| async move {
            records.next().await.map(|item| (item, records))
        })
    }

    /// Drain the remaining records into a vector.
    ///
    /// Stops at the first error. Convenient for small result sets; large
    /// traversals should consume [`next`] incrementally.
    ///
    /// [`next`]: Records::next
    pub async fn collect_all(mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }
}
