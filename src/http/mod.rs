//! HTTP transport module
//!
//! Provides the authenticated DSL transport with retry, throttle handling,
//! and token bucket rate limiting.

mod client;
mod rate_limit;

pub use client::{ClientConfig, ClientConfigBuilder, DslClient, MAX_PAGE_SIZE};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
