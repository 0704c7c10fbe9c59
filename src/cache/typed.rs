//! Typed cache wrapper around Moka.

use std::hash::Hash;
use std::sync::Arc;

use moka::sync::Cache;

use super::CacheConfig;

/// A typed cache wrapper that provides a clean API over Moka.
///
/// This cache is:
/// - Thread-safe (uses Arc internally)
/// - Bounded with optional TTL/TTI
/// - Clone-friendly (cloning is cheap, shares the same underlying cache)
pub struct TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Cache<K, V>>,
    name: Arc<str>,
}

// Manual Clone implementation that doesn't require K: Clone, V: Clone
impl<K, V> Clone for TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            name: Arc::clone(&self.name),
        }
    }
}

impl<K, V> TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new typed cache with the given name and config.
    pub fn new(name: impl Into<Arc<str>>, config: CacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_capacity);

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        Self {
            inner: Arc::new(builder.build()),
            name: name.into(),
        }
    }

    /// Get the name of this cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a value from the cache.
    ///
    /// Returns `Some(value)` if the key exists and hasn't expired.
    #[cfg(test)]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    /// Get or insert a value using a closure.
    ///
    /// If the key exists, returns the cached value.
    /// Otherwise, calls the closure to compute the value, inserts it, and returns it.
    /// Concurrent callers for the same key wait for a single computation.
    pub fn get_or_insert_with<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce() -> V,
        K: Clone,
    {
        self.inner.get_with(key, f)
    }

    /// Insert `value` only if `key` is absent.
    ///
    /// Returns `true` when this call inserted the entry, `false` when a live
    /// entry already existed.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool
    where
        K: Clone,
    {
        self.inner.entry(key).or_insert(value).is_fresh()
    }

    /// Get the number of entries in the cache.
    ///
    /// Note: This may not be perfectly accurate due to pending maintenance.
    #[cfg(test)]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl<K, V> std::fmt::Debug for TypedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCache")
            .field("name", &self.name)
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_insert_computes_once() {
        let cache: TypedCache<String, usize> = TypedCache::new("test", CacheConfig::default());
        let mut calls = 0;

        let first = cache.get_or_insert_with("key".to_string(), || {
            calls += 1;
            7
        });
        let second = cache.get_or_insert_with("key".to_string(), || {
            calls += 1;
            9
        });

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(calls, 1);
        assert_eq!(cache.get(&"key".to_string()), Some(7));
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn test_insert_if_absent() {
        let cache: TypedCache<(i64, i32), ()> =
            TypedCache::new("ledger", CacheConfig::feedback_ledger());

        assert!(cache.insert_if_absent((1, 10), ()));
        assert!(!cache.insert_if_absent((1, 10), ()));
        assert!(cache.insert_if_absent((1, 11), ()));
        assert_eq!(cache.name(), "ledger");
    }
}
