// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # dimensional
//!
//! An async client for a Dimensions-style scholarly search service.
//!
//! The crate sits between a search string written in the service's query
//! DSL and a lazy stream of typed records, hiding authentication, result
//! windowing, throttling, and response caching behind one façade.
//!
//! ## Features
//!
//! - **Validated queries**: the DSL grammar is checked before any network call
//! - **Lazy traversal**: result pages are fetched only as records are consumed
//! - **Rate limiting**: a token bucket plus server quota feedback keeps the
//!   session inside the service's request budget
//! - **Read-through caching**: a result window is fetched at most once per
//!   session
//! - **Lazy field expansion**: entity references (a researcher's affiliation
//!   organizations) resolve on first access, at most once per record
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dimensional::{Session, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::login("user@example.org", "secret")?;
//!
//!     let (total, mut records) = session
//!         .query(r#"search publications for "SBML" return publications"#)
//!         .await?;
//!     println!("{total} matching publications");
//!
//!     while let Some(record) = records.next().await {
//!         let record = record?;
//!         if let Some(publication) = record.as_publication() {
//!             println!("{:?} ({:?})", publication.title(), publication.doi());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Query value type and grammar validation
pub mod query;

/// Authentication and token caching
pub mod auth;

/// HTTP transport with retry and rate limiting
pub mod http;

/// In-memory page cache
pub mod cache;

/// Pagination engine
pub mod pagination;

/// Typed records and lazy field expansion
pub mod record;

/// Session façade and record stream
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{CredentialProvider, Credentials, StaticCredentials};
pub use cache::CacheStats;
pub use error::{Error, Result};
pub use http::{ClientConfig, ClientConfigBuilder, RateLimiterConfig, MAX_PAGE_SIZE};
pub use query::Query;
pub use record::{Author, Grant, Organization, Publication, Record, Researcher};
pub use session::{Records, Session, SessionBuilder};
pub use types::ResultType;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging for applications and examples.
///
/// Installs a `tracing` subscriber honoring `RUST_LOG`, defaulting to INFO.
/// Call once at startup; library code only emits events, it never installs
/// a subscriber on its own.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}
