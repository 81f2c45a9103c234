//! # Rate Limiting
//!
//! Two token buckets guard every outbound call: one keyed by the
//! application identity, one keyed by the target host. A call takes one
//! token from each. When a bucket is empty the caller waits for the refill;
//! calls are never rejected.
//!
//! ```text
//!   acquire(host)
//!      │
//!      ├── identity bucket ["infoplus-sync"]  ── empty? sleep until refill
//!      │
//!      └── domain bucket   ["acme.infopluswms.com"] ── empty? sleep
//! ```
//!
//! The limiter lives as long as the client and is shared by every sync
//! operation in the process.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitSettings;

// =============================================================================
// Token Bucket
// =============================================================================

/// A single refilling bucket.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        TokenBucket {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Takes a token, or returns how long until one is available.
    pub fn try_take(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }

        if self.refill_per_sec <= 0.0 {
            return Err(Duration::from_secs(1));
        }
        let missing = 1.0 - self.tokens;
        Err(Duration::from_secs_f64(missing / self.refill_per_sec))
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }
}

// =============================================================================
// Keyed Limiter
// =============================================================================

/// Buckets of one size, created on first use per key.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        RateLimiter {
            capacity,
            refill_per_sec,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a token for `key` is available and takes it.
    pub async fn acquire(&self, key: &str) {
        loop {
            let wait = {
                let mut buckets = self.buckets.lock().await;
                let bucket = buckets
                    .entry(key.to_string())
                    .or_insert_with(|| TokenBucket::new(self.capacity, self.refill_per_sec));

                match bucket.try_take(Instant::now()) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };

            debug!(key = %key, ?wait, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}

// =============================================================================
// Dual-Scope Limiter
// =============================================================================

/// Identity scope plus domain scope.
#[derive(Debug)]
pub struct DualRateLimiter {
    identity_key: String,
    identity: RateLimiter,
    domain: RateLimiter,
}

impl DualRateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        DualRateLimiter {
            identity_key: settings.identity.clone(),
            identity: RateLimiter::new(
                settings.identity_capacity,
                settings.identity_refill_per_sec,
            ),
            domain: RateLimiter::new(settings.domain_capacity, settings.domain_refill_per_sec),
        }
    }

    /// Takes one token from each scope.
    pub async fn acquire(&self, host: &str) {
        self.identity.acquire(&self.identity_key).await;
        self.domain.acquire(host).await;
    }
}
