//! In-memory providers for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use polars::prelude::DataFrame;
use router_core::{
    AssetClass, CoinDetails, CompanyProfile, CryptoDataProvider, DataProvider, Directory,
    DirectoryRecord, DirectorySource, DividendSchedule, EquityDataProvider, KeyStats, NewsItem,
    OhlcvBar, Quote, Result, RouterError, SeriesKind, Symbol, TrendingCoin, bars_to_frame,
};

/// Ids that fail or never answer.
#[derive(Debug, Default)]
struct Faults {
    failing: HashSet<String>,
    stalled: HashSet<String>,
    down: bool,
}

impl Faults {
    async fn check(&self, id: &str) -> Result<()> {
        if self.stalled.contains(id) {
            return std::future::pending().await;
        }
        if self.down || self.failing.contains(id) {
            return Err(RouterError::Network(format!("{id} is down")));
        }
        Ok(())
    }
}

fn frame() -> Result<DataFrame> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
    bars_to_frame(&[
        OhlcvBar::new(t0, 100.0, 102.0, 99.0, 101.0).with_volume(1000.0),
        OhlcvBar::new(t0 + chrono::Duration::days(1), 101.0, 103.0, 100.0, 102.0),
    ])
}

fn quote_for(id: &str) -> Quote {
    Quote::new(100.0 + id.len() as f64)
        .with_change_percent(1.5)
        .with_market_cap(1.0e9)
}

/// Equity provider that answers every symbol, counting calls.
#[derive(Debug, Default)]
pub(crate) struct MockEquity {
    faults: Faults,
    bar_delay: Option<Duration>,
    pub(crate) quote_calls: AtomicUsize,
    pub(crate) batch_calls: AtomicUsize,
    pub(crate) bar_calls: AtomicUsize,
}

impl MockEquity {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(mut self, id: &str) -> Self {
        self.faults.failing.insert(id.to_string());
        self
    }

    pub(crate) fn stalled(mut self, id: &str) -> Self {
        self.faults.stalled.insert(id.to_string());
        self
    }

    pub(crate) fn down(mut self) -> Self {
        self.faults.down = true;
        self
    }

    pub(crate) fn with_bar_delay(mut self, delay: Duration) -> Self {
        self.bar_delay = Some(delay);
        self
    }
}

impl DataProvider for MockEquity {
    fn name(&self) -> &str {
        "mock equity"
    }

    fn description(&self) -> &str {
        "In-memory equity provider"
    }
}

#[async_trait]
impl EquityDataProvider for MockEquity {
    async fn quote(&self, symbol: &Symbol) -> Result<Quote> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.faults.check(symbol.id()).await?;
        Ok(quote_for(symbol.id()).with_market_open(true))
    }

    async fn quotes(&self, symbols: &[Symbol]) -> Result<HashMap<String, Quote>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.down {
            return Err(RouterError::Network("batch endpoint down".to_string()));
        }
        Ok(symbols
            .iter()
            .filter(|s| !self.faults.failing.contains(s.id()))
            .map(|s| (s.id().to_string(), quote_for(s.id())))
            .collect())
    }

    async fn dividend(&self, symbol: &Symbol) -> Result<DividendSchedule> {
        self.faults.check(symbol.id()).await?;
        Ok(DividendSchedule {
            rate: Some(0.96),
            yield_fraction: Some(0.005),
            ..Default::default()
        })
    }

    async fn news(&self, symbol: &Symbol, limit: usize) -> Result<Vec<NewsItem>> {
        self.faults.check(symbol.id()).await?;
        Ok((0..limit.min(2))
            .map(|i| NewsItem {
                title: format!("{} headline {i}", symbol.id()),
                url: format!("https://news.example/{}/{i}", symbol.id()),
                publisher: None,
                published_at: None,
            })
            .collect())
    }

    async fn profile(&self, symbol: &Symbol) -> Result<CompanyProfile> {
        self.faults.check(symbol.id()).await?;
        Ok(CompanyProfile {
            name: Some(symbol.name().to_string()),
            sector: Some("Consumer Cyclical".to_string()),
            ..Default::default()
        })
    }

    async fn key_stats(&self, symbol: &Symbol) -> Result<KeyStats> {
        self.faults.check(symbol.id()).await?;
        Ok(KeyStats {
            market_cap: Some(8.0e11),
            pe_ratio: Some(60.0),
            ..Default::default()
        })
    }

    async fn bars(&self, symbol: &Symbol, _kind: SeriesKind) -> Result<DataFrame> {
        self.bar_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.bar_delay {
            tokio::time::sleep(delay).await;
        }
        self.faults.check(symbol.id()).await?;
        frame()
    }

    async fn ping(&self) -> Result<()> {
        if self.faults.down {
            return Err(RouterError::Network("unreachable".to_string()));
        }
        Ok(())
    }
}

/// Crypto provider that answers every coin, counting calls.
#[derive(Debug, Default)]
pub(crate) struct MockCrypto {
    faults: Faults,
    trending: Vec<TrendingCoin>,
    pub(crate) batch_calls: AtomicUsize,
    pub(crate) bar_calls: AtomicUsize,
    pub(crate) trending_calls: AtomicUsize,
}

impl MockCrypto {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stalled(mut self, id: &str) -> Self {
        self.faults.stalled.insert(id.to_string());
        self
    }

    pub(crate) fn down(mut self) -> Self {
        self.faults.down = true;
        self
    }

    pub(crate) fn with_trending(mut self, coins: Vec<TrendingCoin>) -> Self {
        self.trending = coins;
        self
    }
}

impl DataProvider for MockCrypto {
    fn name(&self) -> &str {
        "mock crypto"
    }

    fn description(&self) -> &str {
        "In-memory crypto provider"
    }
}

#[async_trait]
impl CryptoDataProvider for MockCrypto {
    async fn quotes(&self, coins: &[Symbol]) -> Result<HashMap<String, Quote>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        for coin in coins {
            if self.faults.stalled.contains(coin.id()) {
                return std::future::pending().await;
            }
        }
        if self.faults.down {
            return Err(RouterError::Network("unreachable".to_string()));
        }
        Ok(coins
            .iter()
            .map(|c| (c.id().to_string(), quote_for(c.id())))
            .collect())
    }

    async fn details(&self, coin: &Symbol) -> Result<CoinDetails> {
        self.faults.check(coin.id()).await?;
        Ok(CoinDetails {
            name: coin.name().to_string(),
            market_cap: Some(1.2e12),
            market_cap_rank: Some(1),
            ..Default::default()
        })
    }

    async fn bars(&self, coin: &Symbol, _kind: SeriesKind) -> Result<DataFrame> {
        self.bar_calls.fetch_add(1, Ordering::SeqCst);
        self.faults.check(coin.id()).await?;
        frame()
    }

    async fn trending(&self) -> Result<Vec<TrendingCoin>> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.down {
            return Err(RouterError::Network("unreachable".to_string()));
        }
        Ok(self.trending.clone())
    }

    async fn ping(&self) -> Result<()> {
        if self.faults.down {
            return Err(RouterError::Network("unreachable".to_string()));
        }
        Ok(())
    }
}

/// Directory source serving a fixed record list.
#[derive(Debug)]
pub(crate) struct MockDirectory {
    class: AssetClass,
    records: Vec<DirectoryRecord>,
    delay: Option<Duration>,
    failing: bool,
    fetches: AtomicUsize,
}

impl MockDirectory {
    fn new(class: AssetClass, records: Vec<DirectoryRecord>) -> Self {
        Self {
            class,
            records,
            delay: None,
            failing: false,
            fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn equities(records: Vec<DirectoryRecord>) -> Self {
        Self::new(AssetClass::Equity, records)
    }

    pub(crate) fn coins(records: Vec<DirectoryRecord>) -> Self {
        Self::new(AssetClass::Crypto, records)
    }

    pub(crate) fn failing(class: AssetClass) -> Self {
        Self {
            failing: true,
            ..Self::new(class, Vec::new())
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DataProvider for MockDirectory {
    fn name(&self) -> &str {
        "mock directory"
    }

    fn description(&self) -> &str {
        "In-memory directory source"
    }
}

#[async_trait]
impl DirectorySource for MockDirectory {
    fn asset_class(&self) -> AssetClass {
        self.class
    }

    async fn fetch_directory(&self) -> Result<Directory> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(RouterError::Network("directory host unreachable".to_string()));
        }
        Ok(Directory::new(self.class, self.records.clone()))
    }
}
