//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-live for cache entries.
    /// After this duration, entries are automatically evicted.
    pub ttl: Option<Duration>,

    /// Time-to-idle for cache entries.
    /// Entries are evicted if not accessed within this duration.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Some(Duration::from_secs(3600)), // 1 hour
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Config for rendered reply text.
    /// Replies rarely repeat, so idle entries go early.
    pub fn rendered_text(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            max_capacity,
            ttl: Some(ttl),
            tti: Some(ttl.min(Duration::from_secs(600))),
        }
    }

    /// Config for the feedback ledger.
    /// Keyboards older than a day are unlikely to be pressed twice.
    pub fn feedback_ledger() -> Self {
        Self {
            max_capacity: 50_000,
            ttl: Some(Duration::from_secs(86_400)), // 1 day
            tti: None,
        }
    }
}
