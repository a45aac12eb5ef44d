//! Rolling-window rate limiting.

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

use sports_query_core::{Error, Provider, Result};

/// Counter for the current window.
#[derive(Debug)]
struct RateLimitState {
    window_start: Instant,
    request_count: u32,
}

/// Per-provider request budget.
///
/// Callers over budget wait for the window to roll over instead of failing,
/// up to `max_wait`. Each provider owns its limiter, so there is no lock
/// ordering between providers.
#[derive(Debug)]
pub struct RateLimiter {
    provider: Provider,
    limit: u32,
    window: Duration,
    max_wait: Duration,
    state: Mutex<RateLimitState>,
}

impl RateLimiter {
    /// Create a limiter allowing `limit` requests per `window`.
    pub fn new(provider: Provider, limit: u32, window: Duration) -> Self {
        Self {
            provider,
            limit: limit.max(1),
            window,
            max_wait: window * 2,
            state: Mutex::new(RateLimitState {
                window_start: Instant::now(),
                request_count: 0,
            }),
        }
    }

    /// Bound the time a caller may spend waiting for budget.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Requests counted in the current window.
    pub async fn used(&self) -> u32 {
        let state = self.state.lock().await;
        if Instant::now() >= state.window_start + self.window {
            0
        } else {
            state.request_count
        }
    }

    /// Take one unit of budget, waiting for rollover when the window is full.
    pub async fn acquire(&self) -> Result<()> {
        let started = Instant::now();
        loop {
            let wake_at = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                if now >= state.window_start + self.window {
                    state.window_start = now;
                    state.request_count = 0;
                }
                if state.request_count < self.limit {
                    state.request_count += 1;
                    return Ok(());
                }
                state.window_start + self.window
            };

            let waited = wake_at.saturating_duration_since(started);
            if waited > self.max_wait {
                return Err(Error::RateLimitTimeout {
                    provider: self.provider,
                    waited_ms: waited.as_millis() as u64,
                });
            }

            tracing::debug!(
                provider = %self.provider,
                limit = self.limit,
                wait_ms = wake_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                "Rate limit reached, waiting for window rollover"
            );
            sleep_until(wake_at).await;
        }
    }
}
