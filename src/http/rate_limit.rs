//! Rate limiting implementation
//!
//! A governor token bucket paces outgoing requests at the configured quota
//! (the service allows 30 calls per 60 seconds by default). On top of the
//! bucket, the limiter tracks the quota window reported by the server and an
//! exponential throttle penalty, so all requesting flows serialize through a
//! single [`admit`] call per session.
//!
//! [`admit`]: RateLimiter::admit

use crate::error::{Error, Result};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Configuration for rate limiting and throttle backoff
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of calls allowed per window
    pub max_calls: u32,
    /// Length of the quota window
    pub period: Duration,
    /// First throttle penalty; doubles on each further throttle signal
    pub backoff_base: Duration,
    /// Ceiling for the throttle penalty
    pub backoff_cap: Duration,
    /// Hard ceiling on the wait a single admission may incur
    pub max_admission_wait: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_calls: 30,
            period: Duration::from_secs(60),
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(120),
            max_admission_wait: Duration::from_secs(300),
        }
    }
}

impl RateLimiterConfig {
    /// Create a config allowing `max_calls` per `period`
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self {
            max_calls,
            period,
            ..Default::default()
        }
    }
}

/// Quota state observed from the most recent server responses
#[derive(Debug, Clone, Default)]
struct RateState {
    /// Calls the server says remain in the current window
    remaining: Option<u32>,
    /// When the server says the window resets
    reset_at: Option<Instant>,
    /// No request may start before this instant (throttle penalty)
    wait_until: Option<Instant>,
    /// Current penalty level, cleared on a successful response
    backoff: Duration,
    /// When the last request was admitted
    last_request: Option<Instant>,
}

/// Token bucket rate limiter with server-feedback throttling
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    state: Arc<Mutex<RateState>>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: RateLimiterConfig) -> Self {
        let cells = NonZeroU32::new(config.max_calls).unwrap_or(NonZeroU32::new(1).unwrap());
        let replenish = config.period / cells.get();
        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_minute(cells))
            .allow_burst(cells);

        Self {
            limiter: Arc::new(Governor::direct(quota)),
            state: Arc::new(Mutex::new(RateState::default())),
            config,
        }
    }

    /// Block the calling task until a request may proceed.
    ///
    /// Waits, in order, for any throttle penalty, any server-reported quota
    /// exhaustion window, and the token bucket. Fails with [`Error::Throttled`]
    /// only when the cumulative wait would exceed the configured ceiling.
    pub async fn admit(&self) -> Result<()> {
        let started = Instant::now();
        let budget = self.config.max_admission_wait;

        let wait = {
            let state = self.state.lock().expect("rate state poisoned");
            let now = Instant::now();
            let mut until = now;
            if let Some(w) = state.wait_until {
                until = until.max(w);
            }
            if state.remaining == Some(0) {
                if let Some(reset) = state.reset_at {
                    until = until.max(reset);
                }
            }
            until.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            if wait > budget {
                return Err(Error::Throttled {
                    retry_after_seconds: Some(wait.as_secs()),
                });
            }
            tracing::debug!(wait_ms = wait.as_millis() as u64, "waiting on rate limit");
            tokio::time::sleep(wait).await;
        }

        let remaining_budget = budget.saturating_sub(started.elapsed());
        tokio::time::timeout(remaining_budget, self.limiter.until_ready())
            .await
            .map_err(|_| Error::Throttled {
                retry_after_seconds: None,
            })?;

        let mut state = self.state.lock().expect("rate state poisoned");
        state.last_request = Some(Instant::now());
        Ok(())
    }

    /// Ingest quota headers from a successful response.
    ///
    /// Clears any throttle penalty: the server answered, so the previous
    /// backoff level no longer applies.
    pub fn record_response(&self, remaining: Option<u32>, reset_after: Option<Duration>) {
        let mut state = self.state.lock().expect("rate state poisoned");
        state.backoff = Duration::ZERO;
        state.wait_until = None;
        if remaining.is_some() {
            state.remaining = remaining;
            state.reset_at = reset_after.map(|d| Instant::now() + d);
        }
    }

    /// Register a throttling signal from the server.
    ///
    /// Escalates the penalty exponentially up to the cap, honoring a larger
    /// server-supplied `Retry-After` when present. Returns the delay the next
    /// admission will wait.
    pub fn note_throttled(&self, retry_after: Option<Duration>) -> Duration {
        let mut state = self.state.lock().expect("rate state poisoned");
        state.backoff = if state.backoff.is_zero() {
            self.config.backoff_base
        } else {
            (state.backoff * 2).min(self.config.backoff_cap)
        };
        let delay = retry_after.unwrap_or(Duration::ZERO).max(state.backoff);
        state.wait_until = Some(Instant::now() + delay);
        state.remaining = Some(0);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "throttled by server");
        delay
    }

    /// The penalty currently in effect, if any
    pub fn current_backoff(&self) -> Duration {
        self.state.lock().expect("rate state poisoned").backoff
    }

    /// Calls remaining in the server's quota window, when known
    pub fn remaining_quota(&self) -> Option<u32> {
        self.state.lock().expect("rate state poisoned").remaining
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
