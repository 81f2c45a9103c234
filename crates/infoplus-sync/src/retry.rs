//! # Retry With Exponential Backoff
//!
//! Write requests are retried on transport failure. Delays start at the
//! initial interval and grow by the multiplier after every failed attempt,
//! with no jitter:
//!
//! ```text
//! attempt 1 ──✗── sleep 1.0s ──► attempt 2 ──✗── sleep 1.5s ──► attempt 3
//!                                                                  │
//!                                         ✓ → value   ✗ → last error
//! ```
//!
//! Non-retryable errors (4xx, bad payloads) end the loop immediately.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SyncResult;

/// How many times and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_interval: Duration::from_secs(1),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    fn create_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.initial_interval,
            randomization_factor: 0.0,
            multiplier: self.multiplier,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();
        backoff
    }
}

/// Runs `operation` until it succeeds, fails permanently, or runs out of
/// attempts. The closure receives the 1-based attempt number.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> SyncResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let mut backoff = policy.create_backoff();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label = %label, attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            debug!(label = %label, attempt, error = %err, "Permanent failure, not retrying");
            return Err(err);
        }

        if attempt >= max_attempts {
            warn!(label = %label, attempts = attempt, error = %err, "Retries exhausted");
            return Err(err);
        }

        let delay = backoff.next_backoff().unwrap_or(policy.initial_interval);
        warn!(
            label = %label,
            attempt,
            ?delay,
            error = %err,
            "Request failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
