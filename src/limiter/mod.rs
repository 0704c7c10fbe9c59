//! Token-bucket rate limiter for outbound generative API calls.
//!
//! The bucket refills continuously at `rate` tokens per second and never holds
//! more than `rate` tokens. The state sits behind an async mutex that is held
//! across the wait, so concurrent callers queue in lock order instead of
//! spending the same allowance twice.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Mutable bucket state, only touched through [`RateLimiter::acquire`].
#[derive(Debug)]
struct Bucket {
    /// Spendable tokens, always within `0.0..=rate`.
    allowance: f64,
    last_check: Instant,
}

/// Shared limiter; wrap in `Arc` or embed in shared state.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` acquisitions per second.
    ///
    /// The bucket starts full, so the first `rate` calls pass immediately.
    pub fn new(rate: u32) -> Self {
        let rate = f64::from(rate.max(1));
        Self {
            rate,
            bucket: Mutex::new(Bucket {
                allowance: rate,
                last_check: Instant::now(),
            }),
        }
    }

    /// Configured rate in acquisitions per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Take one token, waiting until one is available.
    ///
    /// Returns how long the caller was suspended by the bucket itself
    /// (time spent queued behind other callers is not included).
    pub async fn acquire(&self) -> Duration {
        let mut bucket = self.bucket.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_check).as_secs_f64();
        bucket.last_check = now;
        bucket.allowance = (bucket.allowance + elapsed * self.rate).min(self.rate);

        if bucket.allowance >= 1.0 {
            bucket.allowance -= 1.0;
            return Duration::ZERO;
        }

        let wait = wait_for_token(bucket.allowance, self.rate);
        debug!("Rate limiter exhausted, waiting {:?}", wait);
        sleep(wait).await;

        // The token that accrued during the wait is spent by this caller.
        bucket.allowance = 0.0;
        bucket.last_check = Instant::now();
        wait
    }
}

/// Time until `allowance` reaches one whole token, rounded up to the nanosecond.
fn wait_for_token(allowance: f64, rate: f64) -> Duration {
    let secs = (1.0 - allowance).max(0.0) / rate;
    Duration::from_nanos((secs * 1e9).ceil() as u64)
}
