//! Computed-reply cache.

use moka::future::Cache;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default maximum number of cached replies.
pub const DEFAULT_CAPACITY: u64 = 1024;

/// Default idle time after which a reply is dropped.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Default absolute lifetime of a reply, however often it is read.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 60);

/// Bounded cache of computed reply strings.
///
/// Entries expire after `ttl` without a read (sliding), and in any case after
/// `max_age`, so a popular key is still recomputed periodically.
#[derive(Clone)]
pub struct ReplyCache {
    inner: Cache<String, String>,
}

impl fmt::Debug for ReplyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl Default for ReplyCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL, DEFAULT_MAX_AGE)
    }
}

impl ReplyCache {
    /// Create a reply cache with the given capacity, sliding TTL and maximum age.
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration, max_age: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_idle(ttl)
                .time_to_live(max_age.max(ttl))
                .build(),
        }
    }

    /// Returns the cached reply for `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await
    }

    /// Stores a reply.
    pub async fn insert(&self, key: impl Into<String>, reply: String) {
        self.inner.insert(key.into(), reply).await;
    }

    /// Returns the cached reply, or runs `compute` and caches a `Some` result.
    ///
    /// Concurrent callers for the same key share a single computation. A `None`
    /// result is returned as-is and leaves the key absent.
    pub async fn get_or_compute<Fut>(&self, key: &str, compute: Fut) -> Option<String>
    where
        Fut: Future<Output = Option<String>>,
    {
        if let Some(hit) = self.inner.get(key).await {
            debug!(key, "Reply cache hit");
            return Some(hit);
        }
        debug!(key, "Reply cache miss");
        self.inner.optionally_get_with(key.to_string(), compute).await
    }

    /// Drops every cached reply.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_get_or_compute_memoises() {
        let cache = ReplyCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let reply = cache
                .get_or_compute("trending", async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some("hot".to_string())
                })
                .await;
            assert_eq!(reply.as_deref(), Some("hot"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_is_not_cached() {
        let cache = ReplyCache::default();

        assert!(cache.get_or_compute("k", async { None }).await.is_none());
        assert!(cache.get("k").await.is_none());

        let reply = cache.get_or_compute("k", async { Some("v".to_string()) }).await;
        assert_eq!(reply.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_expires_after_ttl() {
        let cache = ReplyCache::new(16, Duration::from_millis(50), Duration::from_millis(50));
        cache.insert("k", "v".to_string()).await;
        assert!(cache.get("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ReplyCache::default();
        cache.insert("a", "1".to_string()).await;
        cache.clear();
        assert!(cache.get("a").await.is_none());
    }
}
