//! Provider traits for fetching market data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`EquityDataProvider`] - Stock quotes, dividends, news, profiles and bars
//! - [`CryptoDataProvider`] - Coin prices, details, bars and the trending list
//! - [`DirectorySource`] - Bulk symbol lists for one asset class
//!
//! Each asset class gets its own capability trait. Operations that make no
//! sense for a class (dividends on a coin) are simply absent from its trait.

use async_trait::async_trait;
use futures::future::join_all;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::{
    directory::Directory,
    error::{Result, RouterError},
    series::SeriesKind,
    types::{
        AssetClass, CoinDetails, CompanyProfile, DividendSchedule, KeyStats, NewsItem, Quote,
        Symbol, TrendingCoin,
    },
};

/// Bound on each single-symbol quote made by the default
/// [`EquityDataProvider::quotes`].
pub const BATCH_QUOTE_TIMEOUT: Duration = Duration::from_secs(4);

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for stock market data.
///
/// Implementations must report an empty answer as [`RouterError::NoData`] and
/// reserve the other variants for transport or payload failures.
#[async_trait]
pub trait EquityDataProvider: DataProvider {
    /// Fetches the latest quote for a stock.
    async fn quote(&self, symbol: &Symbol) -> Result<Quote>;

    /// Fetches quotes for several stocks, keyed by symbol id.
    ///
    /// Symbols the provider has no quote for are absent from the map. The
    /// default implementation fetches each quote concurrently, each bounded by
    /// [`BATCH_QUOTE_TIMEOUT`], so a stalled symbol is dropped from the map
    /// rather than holding the others. Providers with a multi-symbol endpoint
    /// should override it with a single round trip.
    async fn quotes(&self, symbols: &[Symbol]) -> Result<HashMap<String, Quote>> {
        let results = join_all(
            symbols
                .iter()
                .map(|s| timeout(BATCH_QUOTE_TIMEOUT, self.quote(s))),
        )
        .await;

        let mut quotes = HashMap::with_capacity(symbols.len());
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(Ok(quote)) => {
                    quotes.insert(symbol.id().to_string(), quote);
                }
                Ok(Err(e)) => debug!(symbol = %symbol, error = %e, "Skipping quote in batch"),
                Err(_) => debug!(symbol = %symbol, "Quote timed out in batch"),
            }
        }
        Ok(quotes)
    }

    /// Fetches the dividend schedule of a stock.
    async fn dividend(&self, symbol: &Symbol) -> Result<DividendSchedule>;

    /// Fetches up to `limit` recent headlines for a stock.
    async fn news(&self, symbol: &Symbol, limit: usize) -> Result<Vec<NewsItem>>;

    /// Fetches the company profile.
    async fn profile(&self, symbol: &Symbol) -> Result<CompanyProfile>;

    /// Fetches key statistics.
    async fn key_stats(&self, symbol: &Symbol) -> Result<KeyStats>;

    /// Fetches OHLCV bars at the requested resolution.
    async fn bars(&self, symbol: &Symbol, kind: SeriesKind) -> Result<DataFrame>;

    /// Checks that the provider is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Provider for cryptocurrency market data.
#[async_trait]
pub trait CryptoDataProvider: DataProvider {
    /// Fetches prices, 24 hour change and market cap for several coins in one
    /// round trip, keyed by coin id. Coins without data are absent from the map.
    async fn quotes(&self, coins: &[Symbol]) -> Result<HashMap<String, Quote>>;

    /// Fetches the quote for a single coin.
    async fn quote(&self, coin: &Symbol) -> Result<Quote> {
        self.quotes(std::slice::from_ref(coin))
            .await?
            .remove(coin.id())
            .ok_or_else(|| RouterError::NoData(coin.id().to_string()))
    }

    /// Fetches description and statistics for a coin.
    async fn details(&self, coin: &Symbol) -> Result<CoinDetails>;

    /// Fetches OHLC bars at the requested resolution.
    async fn bars(&self, coin: &Symbol, kind: SeriesKind) -> Result<DataFrame>;

    /// Fetches the provider's list of currently trending coins.
    async fn trending(&self) -> Result<Vec<TrendingCoin>>;

    /// Checks that the provider is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Source of the bulk symbol list for one asset class.
#[async_trait]
pub trait DirectorySource: DataProvider {
    /// Returns the asset class this source lists.
    fn asset_class(&self) -> AssetClass;

    /// Downloads a fresh directory snapshot.
    async fn fetch_directory(&self) -> Result<Directory>;
}
