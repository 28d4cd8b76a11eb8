//! In-memory page cache
//!
//! Maps a (query, window) key to previously fetched pages so that a query
//! run twice in one process performs no additional network calls for pages
//! already seen. Entries are immutable once inserted and never expire within
//! a process run; there is no eviction. The cache is safe for concurrent
//! lookups and insertions across in-flight queries.

use crate::pagination::Page;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Key identifying one fetched result window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    query: String,
    offset: u32,
    limit: u32,
}

impl PageKey {
    /// Derive the key for a query string and result window
    pub fn new(query: impl Into<String>, offset: u32, limit: u32) -> Self {
        Self {
            query: query.into(),
            offset,
            limit,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    page: Arc<Page>,
    #[allow(dead_code)]
    fetched_at: Instant,
}

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Pages currently held
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that fell through to the transport
    pub misses: u64,
}

/// Shared page cache for one session
#[derive(Debug, Default)]
pub struct PageCache {
    entries: RwLock<HashMap<PageKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PageCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a page, counting the outcome
    pub fn get(&self, key: &PageKey) -> Option<Arc<Page>> {
        let entries = self.entries.read().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(offset = key.offset, "cache hit");
                Some(Arc::clone(&entry.page))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(offset = key.offset, "cache miss");
                None
            }
        }
    }

    /// Store a fetched page. A concurrent insert for the same key wins
    /// arbitrarily; both copies describe the same window.
    pub fn put(&self, key: PageKey, page: Arc<Page>) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(
            key,
            CacheEntry {
                page,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Number of pages held
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    /// Whether the cache holds no pages
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries (counters are kept)
    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }

    /// Snapshot of cache counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
