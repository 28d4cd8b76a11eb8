//! Common types used throughout the dimensional client
//!
//! Shared type aliases and small utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and JSON values
pub type ValueMap = HashMap<String, JsonValue>;

// ============================================================================
// Result Type
// ============================================================================

/// The entity kind named at the end of a search string.
///
/// Determines which record variant and field schema apply. `Organizations`
/// is never a valid user-facing return clause; it exists for the scoped
/// organization lookups performed during lazy field expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Publications,
    Researchers,
    Grants,
    Organizations,
}

impl ResultType {
    /// Keyword as it appears in a `return` clause and as the key of the
    /// entity array in a response body.
    pub fn keyword(&self) -> &'static str {
        match self {
            ResultType::Publications => "publications",
            ResultType::Researchers => "researchers",
            ResultType::Grants => "grants",
            ResultType::Organizations => "organizations",
        }
    }

    /// Parse a return-clause keyword accepted at the query façade.
    ///
    /// Only the three user-facing result types are accepted here.
    pub fn from_return_keyword(word: &str) -> Option<Self> {
        match word {
            "publications" => Some(ResultType::Publications),
            "researchers" => Some(ResultType::Researchers),
            "grants" => Some(ResultType::Grants),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}
