//! Transport-level retry policy.
//!
//! Requests are retried a fixed number of times on network errors, HTTP 408,
//! 429 and 5xx. Nothing above the transport retries.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Maximum number of retries after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Base delay between retries; attempt `n` waits `n` times this.
const RETRY_DELAY_MS: u64 = 1000;

/// Upper bound for any single wait, including server-provided `Retry-After`.
const MAX_RETRY_DELAY_SECS: u64 = 60;

/// Retry policy for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Linear backoff step.
    pub base_delay: Duration,
    /// Cap applied to every wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_DELAY_MS),
            max_delay: Duration::from_secs(MAX_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits, for tests against local servers.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `op`.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = e
                        .retry_delay_secs()
                        .map_or(self.base_delay * attempt, Duration::from_secs)
                        .min(self.max_delay);
                    warn!(
                        "{what} failed: {e}; retry {attempt} of {} in {delay:?}",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
