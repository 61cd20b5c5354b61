//! Time-series cache.

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use router_core::{AssetClass, Result, SeriesKind, Symbol};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, instrument};

/// Cache entry with the time it was populated.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    populated_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            populated_at: Utc::now(),
        }
    }
}

/// Key for series cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    class: AssetClass,
    id: String,
    kind: SeriesKind,
}

impl SeriesKey {
    fn new(symbol: &Symbol, kind: SeriesKind) -> Self {
        Self {
            class: symbol.asset_class(),
            id: symbol.id().to_string(),
            kind,
        }
    }
}

/// Per-key cell; concurrent misses on one key share a single fetch.
type Slot = Arc<OnceCell<CacheEntry<DataFrame>>>;

/// OHLCV frames keyed by resolved symbol id and resolution.
///
/// Entries never age out individually; the whole cache is cleared by the
/// scheduled refresh job. Each key holds one slot, and only the first miss on
/// a slot runs its fetch while later callers wait for it. Clearing drops every
/// slot, so a fetch that began before the clear completes into a detached slot:
/// its callers get the frame but the cache does not keep it.
#[derive(Debug, Default)]
pub struct SeriesCache {
    slots: RwLock<HashMap<SeriesKey, Slot>>,
}

impl SeriesCache {
    /// Create a new empty series cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached frame for a symbol, if any.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get(&self, symbol: &Symbol, kind: SeriesKind) -> Option<DataFrame> {
        let key = SeriesKey::new(symbol, kind);
        let slots = self.slots.read().await;
        match slots.get(&key).and_then(|slot| slot.get()) {
            Some(entry) => {
                debug!(populated_at = %entry.populated_at, "Cache hit for series");
                Some(entry.data.clone())
            }
            None => {
                debug!("Cache miss for series");
                None
            }
        }
    }

    /// Stores a frame for a symbol, replacing any previous entry.
    #[instrument(skip(self, data), fields(symbol = %symbol, rows = data.height()))]
    pub async fn put(&self, symbol: &Symbol, kind: SeriesKind, data: DataFrame) {
        let key = SeriesKey::new(symbol, kind);
        let slot = Arc::new(OnceCell::new_with(Some(CacheEntry::new(data))));
        self.slots.write().await.insert(key, slot);
        debug!("Cached series");
    }

    /// Returns the cached frame, or runs `fetch` and caches its successful result.
    ///
    /// Concurrent callers for the same key share one `fetch`. No lock is held
    /// while it runs; the map lock only guards finding or creating the slot.
    /// Errors leave the slot empty, so the next caller fetches again.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        symbol: &Symbol,
        kind: SeriesKind,
        fetch: F,
    ) -> Result<DataFrame>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<DataFrame>> + Send,
    {
        if let Some(hit) = self.get(symbol, kind).await {
            return Ok(hit);
        }

        let slot = {
            let mut slots = self.slots.write().await;
            Arc::clone(slots.entry(SeriesKey::new(symbol, kind)).or_default())
        };

        let entry = slot
            .get_or_try_init(|| async {
                let data = fetch().await?;
                debug!(symbol = %symbol, rows = data.height(), "Fetched series");
                Ok::<_, router_core::RouterError>(CacheEntry::new(data))
            })
            .await?;
        Ok(entry.data.clone())
    }

    /// Removes every entry. Returns the number of cached frames removed.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> usize {
        let mut slots = self.slots.write().await;
        let removed = slots.values().filter(|slot| slot.initialized()).count();
        slots.clear();
        debug!("Cleared {} series entries", removed);
        removed
    }

    /// Returns the number of cached frames.
    pub async fn len(&self) -> usize {
        self.slots
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use router_core::{DirectoryRecord, RouterError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn tsla() -> Symbol {
        Symbol::equity("tsla", &DirectoryRecord::new("TSLA", "TSLA", "Tesla, Inc."))
    }

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("open".into(), vec![150.0, 151.0]),
            Column::new("close".into(), vec![151.0, 152.0]),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_put() {
        let cache = SeriesCache::new();
        let kind = SeriesKind::Daily { days: 30 };

        assert!(cache.get(&tsla(), kind).await.is_none());
        cache.put(&tsla(), kind, frame()).await;
        assert_eq!(cache.get(&tsla(), kind).await.unwrap().height(), 2);
        assert!(cache.get(&tsla(), SeriesKind::Intraday).await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_fetch_fetches_once_per_epoch() {
        let cache = SeriesCache::new();
        let calls = AtomicUsize::new(0);
        let kind = SeriesKind::Daily { days: 30 };
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(frame())
        };

        cache.get_or_fetch(&tsla(), kind, fetch).await.unwrap();
        cache.get_or_fetch(&tsla(), kind, fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(cache.clear().await, 1);
        assert!(cache.is_empty().await);

        cache.get_or_fetch(&tsla(), kind, fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = SeriesCache::new();
        let result = cache
            .get_or_fetch(&tsla(), SeriesKind::Intraday, || async {
                Err(RouterError::Network("down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_fetch_spanning_clear_is_not_stored() {
        let cache = SeriesCache::new();
        let result = cache
            .get_or_fetch(&tsla(), SeriesKind::Intraday, || async {
                cache.clear().await;
                Ok(frame())
            })
            .await;

        assert_eq!(result.unwrap().height(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache = SeriesCache::new();
        let calls = AtomicUsize::new(0);
        let kind = SeriesKind::Daily { days: 30 };
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(frame())
        };

        let (sym_a, sym_b) = (tsla(), tsla());
        let (a, b) = tokio::join!(
            cache.get_or_fetch(&sym_a, kind, fetch),
            cache.get_or_fetch(&sym_b, kind, fetch),
        );

        assert_eq!(a.unwrap().height(), 2);
        assert_eq!(b.unwrap().height(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retried() {
        let cache = SeriesCache::new();
        let kind = SeriesKind::Intraday;

        cache
            .get_or_fetch(&tsla(), kind, || async {
                Err(RouterError::Network("down".to_string()))
            })
            .await
            .unwrap_err();
        let data = cache
            .get_or_fetch(&tsla(), kind, || async { Ok(frame()) })
            .await
            .unwrap();

        assert_eq!(data.height(), 2);
        assert_eq!(cache.len().await, 1);
    }
}
