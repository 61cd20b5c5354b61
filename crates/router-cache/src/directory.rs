//! Directory snapshot cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use router_core::{AssetClass, Directory, DirectorySource, Result, RouterError};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Current snapshot of one asset class.
#[derive(Debug)]
struct Slot {
    current: RwLock<Arc<Directory>>,
    loaded: AtomicBool,
}

impl Slot {
    fn new(class: AssetClass) -> Self {
        Self {
            current: RwLock::new(Arc::new(Directory::empty(class))),
            loaded: AtomicBool::new(false),
        }
    }
}

/// Holds exactly one current [`Directory`] per asset class.
///
/// Readers clone the `Arc` under a short read lock and then work on the
/// snapshot without holding anything. Retired snapshots are freed once the
/// last reader drops its `Arc`.
#[derive(Debug)]
pub struct DirectoryCache {
    equity: Slot,
    crypto: Slot,
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryCache {
    /// Create a cache holding empty snapshots for both asset classes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            equity: Slot::new(AssetClass::Equity),
            crypto: Slot::new(AssetClass::Crypto),
        }
    }

    const fn slot(&self, class: AssetClass) -> &Slot {
        match class {
            AssetClass::Equity => &self.equity,
            AssetClass::Crypto => &self.crypto,
        }
    }

    /// Returns the current snapshot for an asset class.
    pub async fn current(&self, class: AssetClass) -> Arc<Directory> {
        Arc::clone(&*self.slot(class).current.read().await)
    }

    /// Returns true once a snapshot has been successfully loaded for the class.
    #[must_use]
    pub fn is_loaded(&self, class: AssetClass) -> bool {
        self.slot(class).loaded.load(Ordering::Acquire)
    }

    /// Swaps in a new snapshot for its asset class.
    pub async fn replace(&self, directory: Directory) {
        let slot = self.slot(directory.asset_class());
        let directory = Arc::new(directory);
        *slot.current.write().await = directory;
        slot.loaded.store(true, Ordering::Release);
    }

    /// Downloads a fresh snapshot from `source` and swaps it in.
    ///
    /// The download happens without holding any lock. On failure, or when the
    /// source returns an empty list, the previous snapshot stays current and the
    /// error is returned for the caller to report.
    #[instrument(skip(self, source), fields(source = source.name(), class = %source.asset_class()))]
    pub async fn refresh(&self, source: &dyn DirectorySource) -> Result<usize> {
        let class = source.asset_class();
        debug!("Refreshing directory");

        let directory = match source.fetch_directory().await {
            Ok(directory) => directory,
            Err(e) => {
                warn!(error = %e, "Directory refresh failed, keeping previous snapshot");
                return Err(e);
            }
        };

        if directory.asset_class() != class {
            let e = RouterError::Other(format!(
                "{} returned a {} directory",
                source.name(),
                directory.asset_class()
            ));
            warn!(error = %e, "Directory refresh failed, keeping previous snapshot");
            return Err(e);
        }

        if directory.is_empty() {
            warn!("Directory source returned no records, keeping previous snapshot");
            return Err(RouterError::NoData(format!("{class} directory")));
        }

        let count = directory.len();
        self.replace(directory).await;
        info!(records = count, "Directory refreshed");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use router_core::{DataProvider, DirectoryRecord};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct ScriptedSource {
        class: AssetClass,
        responses: Mutex<Vec<Result<Vec<DirectoryRecord>>>>,
    }

    impl DataProvider for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn description(&self) -> &str {
            "Returns queued responses"
        }
    }

    #[async_trait]
    impl DirectorySource for ScriptedSource {
        fn asset_class(&self) -> AssetClass {
            self.class
        }

        async fn fetch_directory(&self) -> Result<Directory> {
            let next = self.responses.lock().unwrap().remove(0);
            next.map(|records| Directory::new(self.class, records))
        }
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let cache = DirectoryCache::new();
        assert!(cache.current(AssetClass::Equity).await.is_empty());
        assert!(!cache.is_loaded(AssetClass::Equity));
        assert!(!cache.is_loaded(AssetClass::Crypto));
    }

    #[tokio::test]
    async fn test_refresh_serves_stale_on_error() {
        let cache = DirectoryCache::new();
        let source = ScriptedSource {
            class: AssetClass::Equity,
            responses: Mutex::new(vec![
                Ok(vec![DirectoryRecord::new("TSLA", "TSLA", "Tesla, Inc.")]),
                Err(RouterError::Network("boom".to_string())),
                Ok(Vec::new()),
            ]),
        };

        assert_eq!(cache.refresh(&source).await.unwrap(), 1);
        assert!(cache.is_loaded(AssetClass::Equity));

        assert!(cache.refresh(&source).await.is_err());
        assert!(cache.current(AssetClass::Equity).await.find("tsla").is_some());

        assert!(cache.refresh(&source).await.is_err());
        assert_eq!(cache.current(AssetClass::Equity).await.len(), 1);
    }

    #[tokio::test]
    async fn test_readers_keep_their_snapshot() {
        let cache = DirectoryCache::new();
        cache
            .replace(Directory::new(
                AssetClass::Crypto,
                vec![DirectoryRecord::new("bitcoin", "btc", "Bitcoin")],
            ))
            .await;

        let held = cache.current(AssetClass::Crypto).await;
        cache
            .replace(Directory::new(
                AssetClass::Crypto,
                vec![DirectoryRecord::new("ethereum", "eth", "Ethereum")],
            ))
            .await;

        assert!(held.find("btc").is_some());
        assert!(cache.current(AssetClass::Crypto).await.find("btc").is_none());
        assert!(cache.current(AssetClass::Equity).await.is_empty());
    }
}
