//! Per-field lazy resolution state
//!
//! A [`Deferred`] field starts as a set of unresolved entity ids and moves
//! to a resolved value on first read. Resolution happens at most once per
//! record instance, including under concurrent reads; later reads return the
//! stored value without I/O.

use crate::error::Result;
use tokio::sync::OnceCell;

/// A field resolved lazily from entity references
#[derive(Debug)]
pub struct Deferred<T> {
    pending: Vec<String>,
    cell: OnceCell<T>,
}

impl<T> Deferred<T> {
    /// A field still holding unresolved entity ids
    pub fn unresolved(ids: Vec<String>) -> Self {
        Self {
            pending: ids,
            cell: OnceCell::new(),
        }
    }

    /// A field whose value was available eagerly
    pub fn resolved(value: T) -> Self {
        Self {
            pending: Vec::new(),
            cell: OnceCell::new_with(Some(value)),
        }
    }

    /// Whether the value has been resolved
    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    /// Entity ids awaiting resolution
    pub fn pending_ids(&self) -> &[String] {
        &self.pending
    }

    /// The resolved value, when already present
    pub fn value(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Resolve on first call via `init`, then serve the stored value.
    ///
    /// Concurrent callers race on a single initialization; `init` runs at
    /// most once per instance unless it fails, in which case a later read
    /// may try again.
    pub(crate) async fn get_or_resolve<F, Fut>(&self, init: F) -> Result<&T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        self.cell.get_or_try_init(init).await
    }
}
