//! Pagination engine
//!
//! [`Pages`] drives repeated transport calls to satisfy a query beyond a
//! single result window. It is a lazy pull-based sequence: nothing is
//! fetched until [`next_page`] is called, and abandoning the sequence early
//! performs no further I/O.
//!
//! Termination: an empty page or an offset at or past the latest
//! server-reported total, whichever comes first. When the reported total
//! changes between pages (remote data mutated mid-iteration) the most recent
//! value wins; a short page is not a fault.
//!
//! [`next_page`]: Pages::next_page

use crate::error::Result;
use crate::http::DslClient;
use crate::query::Query;
use crate::types::JsonObject;
use std::sync::Arc;

/// One bounded batch of raw results from a single request
#[derive(Debug, Clone)]
pub struct Page {
    /// Offset this window was requested at
    pub offset: u32,
    /// Window size requested
    pub limit: u32,
    /// Total matching records reported by the server with this window
    pub total_count: u64,
    /// Raw entity objects, in server order
    pub items: Vec<JsonObject>,
}

impl Page {
    /// Number of items in this window
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the window came back empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result-window bookkeeping for one traversal
#[derive(Debug, Clone)]
pub struct PageCursor {
    offset: u32,
    page_size: u32,
    total: Option<u64>,
    done: bool,
}

impl PageCursor {
    /// Start a cursor at offset zero
    pub fn new(page_size: u32) -> Self {
        Self {
            offset: 0,
            page_size,
            total: None,
            done: false,
        }
    }

    /// Offset of the next window to fetch
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Latest server-reported total, once a page has been seen
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Whether the traversal has reached a terminal condition
    pub fn exhausted(&self) -> bool {
        if self.done {
            return true;
        }
        matches!(self.total, Some(total) if u64::from(self.offset) >= total)
    }

    /// Record a fetched page: adopt its reported total and advance by the
    /// fixed page size, or stop on an empty window.
    pub fn advance(&mut self, page: &Page) {
        self.total = Some(page.total_count);
        if page.items.is_empty() {
            self.done = true;
        } else {
            self.offset += self.page_size;
        }
    }
}

/// Lazy sequence of pages for one query traversal.
///
/// Restartable: a fresh `Pages` for the same query re-derives from offset
/// zero and re-uses the session cache, so no network call is repeated for a
/// window already fetched.
#[derive(Debug)]
pub struct Pages {
    client: Arc<DslClient>,
    query: Query,
    cursor: PageCursor,
}

impl Pages {
    /// Create a page sequence over `query` using the session's client
    pub(crate) fn new(client: Arc<DslClient>, query: Query) -> Self {
        let cursor = PageCursor::new(client.page_size());
        Self {
            client,
            query,
            cursor,
        }
    }

    /// The query this sequence traverses
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Latest server-reported total, once the first page has been fetched
    pub fn total_count(&self) -> Option<u64> {
        self.cursor.total()
    }

    /// Fetch the next page, or `None` once the traversal is exhausted.
    ///
    /// Pages are yielded in non-decreasing offset order. Errors from the
    /// transport propagate without advancing the cursor.
    pub async fn next_page(&mut self) -> Result<Option<Arc<Page>>> {
        if self.cursor.exhausted() {
            return Ok(None);
        }

        let page = self
            .client
            .fetch_page(&self.query, self.cursor.offset(), self.client.page_size())
            .await?;
        self.cursor.advance(&page);

        if page.is_empty() {
            return Ok(None);
        }
        Ok(Some(page))
    }
}
