//! Query value type and grammar validation
//!
//! A [`Query`] is an immutable, validated search string plus the result type
//! declared by its `return` clause. Validation happens once, at construction,
//! before any network call is made.
//!
//! # Accepted grammar
//!
//! - the string starts with the keyword `search`
//! - it contains exactly one `return` keyword
//! - it ends with `return <type>` where `<type>` is one of `publications`,
//!   `researchers`, `grants`
//! - facet/aggregation tokens (`aggregate`, `facet`) are rejected

mod validate;

pub use validate::validate;

use crate::error::{Error, Result};
use crate::types::ResultType;

/// An immutable, validated search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    result_type: ResultType,
}

impl Query {
    /// Parse and validate a user-supplied search string.
    ///
    /// Returns [`Error::InvalidQuery`] when the string does not match the
    /// accepted grammar. No network I/O is performed.
    pub fn parse(search: &str) -> Result<Self> {
        let raw = search.trim();
        let result_type = validate(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            result_type,
        })
    }

    /// Build the scoped lookup query used to resolve an expandable field.
    ///
    /// This bypasses the user-facing grammar (organizations is not a valid
    /// user return clause) but produces a well-formed DSL string, so lookup
    /// pages flow through the same transport and cache as search pages.
    pub(crate) fn entity_lookup(result_type: ResultType, ids: &[String]) -> Self {
        let quoted: Vec<String> = ids.iter().map(|id| format!("\"{id}\"")).collect();
        let raw = format!(
            "search {kw} where id in [{ids}] return {kw}",
            kw = result_type.keyword(),
            ids = quoted.join(", ")
        );
        Self { raw, result_type }
    }

    /// The validated search string, exactly as sent to the server
    /// (before pagination parameters are appended).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The result type declared by the `return` clause.
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::convert::TryFrom<&str> for Query {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Query::parse(value)
    }
}

#[cfg(test)]
mod tests;
