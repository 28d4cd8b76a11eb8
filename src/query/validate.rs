//! Grammar checks for user-supplied search strings

use crate::error::{Error, Result};
use crate::types::ResultType;
use once_cell::sync::Lazy;
use regex::Regex;

static RETURN_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\breturn\b").unwrap());

static RETURN_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\breturn\s+(\S.*)$").unwrap());

static FORBIDDEN_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(aggregate|facet)\b").unwrap());

/// Validate a trimmed search string against the accepted grammar.
///
/// Returns the declared result type on success.
pub fn validate(raw: &str) -> Result<ResultType> {
    if raw.is_empty() {
        return Err(Error::invalid_query("query string is empty"));
    }

    if raw != "search" && !raw.starts_with("search ") {
        return Err(Error::invalid_query(
            "query must start with the keyword 'search'",
        ));
    }

    if let Some(token) = FORBIDDEN_TOKEN.find(raw) {
        return Err(Error::invalid_query(format!(
            "facet/aggregation clauses are not supported: found '{}'",
            token.as_str()
        )));
    }

    match RETURN_KEYWORD.find_iter(raw).count() {
        0 => {
            return Err(Error::invalid_query(
                "query must end with a 'return <type>' clause",
            ))
        }
        1 => {}
        n => {
            return Err(Error::invalid_query(format!(
                "query names {n} 'return' clauses, expected exactly one"
            )))
        }
    }

    let clause = RETURN_CLAUSE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| Error::invalid_query("query must end with a 'return <type>' clause"))?;

    // The clause must be a single bare type keyword; anything else (a comma
    // list of types, trailing field selectors we do not support) is rejected.
    if clause.split_whitespace().count() != 1 || clause.contains(',') {
        return Err(Error::invalid_query(format!(
            "'return {clause}' must name exactly one result type"
        )));
    }

    ResultType::from_return_keyword(clause).ok_or_else(|| {
        Error::invalid_query(format!(
            "unknown result type '{clause}', expected one of: publications, researchers, grants"
        ))
    })
}
