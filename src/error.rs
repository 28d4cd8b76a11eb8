//! Error types for the dimensional client
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! The taxonomy mirrors how failures propagate: `InvalidQuery` is reported
//! synchronously before any network call; `Throttled` and `Network` are
//! recovered inside the transport up to a bound before surfacing; `Auth`,
//! `Server`, and `Parse` surface immediately at the point of traversal
//! where they occur.

use thiserror::Error;

/// The main error type for the dimensional client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Query Errors
    // ============================================================================
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("Rate limit exceeded{}", retry_after_seconds.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    Throttled { retry_after_seconds: Option<u64> },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    #[error("Failed to parse response: {message}")]
    Parse { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create an invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a server error
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error class is recovered by retrying inside the transport.
    ///
    /// Only throttling and transient connectivity qualify. Server errors are
    /// excluded: retrying them is unlikely to help and burns quota.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Throttled { .. } | Error::Network { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network {
            message: err.to_string(),
        }
    }
}

/// Result type alias for the dimensional client
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_query("missing return clause");
        assert_eq!(err.to_string(), "Invalid query: missing return clause");

        let err = Error::auth("bad credentials");
        assert_eq!(err.to_string(), "Authentication failed: bad credentials");

        let err = Error::server(500, "boom");
        assert_eq!(err.to_string(), "Server error (HTTP 500): boom");

        let err = Error::Throttled {
            retry_after_seconds: Some(30),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded, retry after 30s");

        let err = Error::Throttled {
            retry_after_seconds: None,
        };
        assert_eq!(err.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn test_is_transient() {
        assert!(Error::Throttled {
            retry_after_seconds: None
        }
        .is_transient());
        assert!(Error::network("connection refused").is_transient());

        assert!(!Error::auth("bad credentials").is_transient());
        assert!(!Error::server(500, "").is_transient());
        assert!(!Error::invalid_query("x").is_transient());
        assert!(!Error::parse("bad json").is_transient());
    }
}
