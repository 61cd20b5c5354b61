#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/router/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! CoinGecko data provider.
//!
//! This crate implements the router-core crypto traits for the
//! [CoinGecko](https://www.coingecko.com/en/api) API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use router_coingecko::CoinGeckoProvider;
//! use router_core::{CryptoDataProvider, DirectorySource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = CoinGeckoProvider::new(None);
//!
//!     let directory = provider.fetch_directory().await?;
//!     let btc = directory.find("btc").expect("bitcoin is listed");
//!     let symbol = router_core::Symbol::crypto("btc", btc);
//!
//!     let quote = provider.quote(&symbol).await?;
//!     println!("{symbol}: {}", quote.price);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use polars::prelude::DataFrame;
use reqwest::Client;
use router_core::{
    AssetClass, CoinDetails, CryptoDataProvider, DataProvider, Directory, DirectoryRecord,
    DirectorySource, OhlcvBar, Quote, Result, RouterError, SeriesKind, Symbol, TrendingCoin,
    bars_to_frame,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Base URL for the CoinGecko v3 API.
const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Header carrying a demo API key.
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Quote currency for every request.
const VS_CURRENCY: &str = "usd";

/// Candle ranges the OHLC endpoint accepts, in days.
const OHLC_DAYS: &[u32] = &[1, 7, 14, 30, 90, 180, 365];

/// CoinGecko data provider.
///
/// Provides access to:
/// - Batched spot prices with 24h change and market cap
/// - Coin descriptions and statistics
/// - OHLC candles
/// - The trending search list
/// - The full coin list, as a [`DirectorySource`]
#[derive(Clone)]
pub struct CoinGeckoProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for CoinGeckoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinGeckoProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CoinGeckoProvider {
    /// Create a new CoinGecko provider, optionally with a demo API key.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, api_key)
    }

    /// Create a new CoinGecko provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: COINGECKO_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!("CoinGecko request: {}", endpoint);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RouterError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(RouterError::RateLimited {
                provider: "CoinGecko".to_string(),
                retry_after,
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RouterError::NoData(endpoint.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RouterError::Network(format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RouterError::Network(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| RouterError::Parse(format!("{e}: {text}")))
    }

    /// Fetch simple prices for a list of coin ids.
    async fn simple_prices(&self, ids: &[&str]) -> Result<HashMap<String, Quote>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let endpoint = format!(
            "simple/price?ids={}&vs_currencies={VS_CURRENCY}&include_24hr_change=true&include_market_cap=true",
            ids.join(",")
        );
        let prices: HashMap<String, SimplePrice> = self.get(&endpoint).await?;
        Ok(quotes_from_simple(prices))
    }
}

impl DataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn description(&self) -> &str {
        "CoinGecko - cryptocurrency prices, coin details and trending searches"
    }
}

#[async_trait]
impl CryptoDataProvider for CoinGeckoProvider {
    async fn quotes(&self, coins: &[Symbol]) -> Result<HashMap<String, Quote>> {
        let mut ids: Vec<&str> = coins.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        self.simple_prices(&ids).await
    }

    async fn details(&self, coin: &Symbol) -> Result<CoinDetails> {
        let endpoint = format!(
            "coins/{}?localization=false&tickers=false&community_data=false&developer_data=false",
            coin.id()
        );
        let data: CgCoin = self.get(&endpoint).await?;
        Ok(data.into())
    }

    async fn bars(&self, coin: &Symbol, kind: SeriesKind) -> Result<DataFrame> {
        let days = ohlc_days(kind);
        let endpoint = format!(
            "coins/{}/ohlc?vs_currency={VS_CURRENCY}&days={days}",
            coin.id()
        );
        let rows: Vec<[f64; 5]> = self.get(&endpoint).await?;
        let bars = bars_from_ohlc(&rows);
        if bars.is_empty() {
            return Err(RouterError::NoData(format!("bars for {}", coin.id())));
        }
        bars_to_frame(&bars)
    }

    async fn trending(&self) -> Result<Vec<TrendingCoin>> {
        let response: CgTrending = self.get("search/trending").await?;
        let mut coins = trending_from_search(response);

        let missing: Vec<String> = coins
            .iter()
            .filter(|c| c.change_percent.is_none())
            .map(|c| c.id.clone())
            .collect();
        if !missing.is_empty() {
            let ids: Vec<&str> = missing.iter().map(String::as_str).collect();
            match self.simple_prices(&ids).await {
                Ok(prices) => {
                    for coin in &mut coins {
                        if coin.change_percent.is_none() {
                            coin.change_percent =
                                prices.get(&coin.id).and_then(|q| q.change_percent);
                        }
                    }
                }
                Err(e) => debug!(error = %e, "Trending coins left without price change"),
            }
        }

        if coins.is_empty() {
            return Err(RouterError::NoData("trending coins".to_string()));
        }
        Ok(coins)
    }

    async fn ping(&self) -> Result<()> {
        let _: serde_json::Value = self.get("ping").await?;
        Ok(())
    }
}

#[async_trait]
impl DirectorySource for CoinGeckoProvider {
    fn asset_class(&self) -> AssetClass {
        AssetClass::Crypto
    }

    async fn fetch_directory(&self) -> Result<Directory> {
        let coins: Vec<CgListedCoin> = self.get("coins/list").await?;
        debug!("Loaded {} coins from CoinGecko", coins.len());
        Ok(directory_from_list(coins))
    }
}

/// Picks the smallest supported candle range covering the requested kind.
fn ohlc_days(kind: SeriesKind) -> u32 {
    match kind {
        SeriesKind::Intraday => 1,
        SeriesKind::Daily { days } => OHLC_DAYS
            .iter()
            .copied()
            .find(|&d| d >= days)
            .unwrap_or(365),
    }
}

fn bars_from_ohlc(rows: &[[f64; 5]]) -> Vec<OhlcvBar> {
    rows.iter()
        .filter_map(|&[ts, open, high, low, close]| {
            let timestamp = Utc.timestamp_millis_opt(ts as i64).single()?;
            Some(OhlcvBar::new(timestamp, open, high, low, close))
        })
        .collect()
}

fn quotes_from_simple(prices: HashMap<String, SimplePrice>) -> HashMap<String, Quote> {
    prices
        .into_iter()
        .filter_map(|(id, p)| {
            let mut quote = Quote::new(p.usd?);
            if let Some(change) = p.usd_24h_change {
                quote = quote.with_change_percent(change);
            }
            if let Some(cap) = p.usd_market_cap {
                quote = quote.with_market_cap(cap);
            }
            Some((id, quote))
        })
        .collect()
}

fn trending_from_search(response: CgTrending) -> Vec<TrendingCoin> {
    response
        .coins
        .into_iter()
        .map(|c| TrendingCoin {
            change_percent: c
                .item
                .data
                .and_then(|d| d.price_change_percentage_24h)
                .and_then(|m| m.get(VS_CURRENCY).copied()),
            id: c.item.id,
            symbol: c.item.symbol.to_uppercase(),
            name: c.item.name,
        })
        .collect()
}

fn directory_from_list(coins: Vec<CgListedCoin>) -> Directory {
    let records = coins
        .into_iter()
        .map(|c| DirectoryRecord::new(c.id, c.symbol, c.name))
        .collect();
    Directory::new(AssetClass::Crypto, records)
}

// ============================================================================
// CoinGecko API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CgListedCoin {
    id: String,
    symbol: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CgTrending {
    #[serde(default)]
    coins: Vec<CgTrendingEntry>,
}

#[derive(Debug, Deserialize)]
struct CgTrendingEntry {
    item: CgTrendingItem,
}

#[derive(Debug, Deserialize)]
struct CgTrendingItem {
    id: String,
    symbol: String,
    name: String,
    data: Option<CgTrendingData>,
}

#[derive(Debug, Deserialize)]
struct CgTrendingData {
    price_change_percentage_24h: Option<HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct CgCoin {
    name: String,
    #[serde(default)]
    links: Option<CgLinks>,
    #[serde(default)]
    description: Option<HashMap<String, String>>,
    market_cap_rank: Option<u32>,
    #[serde(default)]
    market_data: Option<CgMarketData>,
}

#[derive(Debug, Deserialize)]
struct CgLinks {
    #[serde(default)]
    homepage: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CgMarketData {
    #[serde(default)]
    market_cap: HashMap<String, f64>,
    #[serde(default)]
    total_volume: HashMap<String, f64>,
    #[serde(default)]
    ath: HashMap<String, f64>,
    circulating_supply: Option<f64>,
}

fn usd(values: &HashMap<String, f64>) -> Option<f64> {
    values.get(VS_CURRENCY).copied()
}

impl From<CgCoin> for CoinDetails {
    fn from(c: CgCoin) -> Self {
        let market = c.market_data.as_ref();

        Self {
            homepage: c
                .links
                .and_then(|l| l.homepage.into_iter().find(|h| !h.is_empty())),
            description: c
                .description
                .and_then(|mut d| d.remove("en"))
                .filter(|d| !d.is_empty()),
            market_cap_rank: c.market_cap_rank,
            market_cap: market.and_then(|m| usd(&m.market_cap)),
            total_volume: market.and_then(|m| usd(&m.total_volume)),
            all_time_high: market.and_then(|m| usd(&m.ath)),
            circulating_supply: market.and_then(|m| m.circulating_supply),
            name: c.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let provider = CoinGeckoProvider::new(Some("secret-key".to_string()));
        let debug = format!("{provider:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_provider_traits() {
        let provider = CoinGeckoProvider::new(None);
        assert_eq!(provider.name(), "CoinGecko");
        assert_eq!(provider.asset_class(), AssetClass::Crypto);
    }

    #[test]
    fn test_ohlc_days_rounds_up() {
        assert_eq!(ohlc_days(SeriesKind::Intraday), 1);
        assert_eq!(ohlc_days(SeriesKind::Daily { days: 30 }), 30);
        assert_eq!(ohlc_days(SeriesKind::Daily { days: 31 }), 90);
        assert_eq!(ohlc_days(SeriesKind::Daily { days: 1000 }), 365);
    }

    #[test]
    fn test_directory_keeps_source_order() {
        let body = r#"[
            {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"},
            {"id": "batcat", "symbol": "btc", "name": "batcat"},
            {"id": "ethereum", "symbol": "eth", "name": "Ethereum"}
        ]"#;
        let coins: Vec<CgListedCoin> = serde_json::from_str(body).unwrap();
        let dir = directory_from_list(coins);

        assert_eq!(dir.len(), 3);
        assert_eq!(dir.find("BTC").unwrap().id, "bitcoin");
        assert_eq!(dir.find_all("btc").count(), 2);
    }

    #[test]
    fn test_quotes_from_simple() {
        let body = r#"{
            "bitcoin": {"usd": 65000.0, "usd_24h_change": -1.5, "usd_market_cap": 1.2e12},
            "ghost": {}
        }"#;
        let prices: HashMap<String, SimplePrice> = serde_json::from_str(body).unwrap();
        let quotes = quotes_from_simple(prices);

        assert_eq!(quotes.len(), 1);
        let btc = &quotes["bitcoin"];
        assert_eq!(btc.price, 65000.0);
        assert_eq!(btc.change_percent, Some(-1.5));
        assert_eq!(btc.market_cap, Some(1.2e12));
        assert_eq!(btc.market_open, None);
    }

    #[test]
    fn test_bars_from_ohlc() {
        let rows = vec![
            [1_700_000_000_000.0, 1.0, 2.0, 0.5, 1.5],
            [1_700_001_800_000.0, 1.5, 2.5, 1.0, 2.0],
        ];
        let bars = bars_from_ohlc(&rows);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 2.0);
        assert!(bars[0].volume.is_none());
    }

    #[test]
    fn test_trending_from_search() {
        let body = r#"{"coins": [
            {"item": {"id": "pepe", "symbol": "pepe", "name": "Pepe", "data": {"price_change_percentage_24h": {"usd": 12.5}}}},
            {"item": {"id": "sui", "symbol": "sui", "name": "Sui"}}
        ]}"#;
        let response: CgTrending = serde_json::from_str(body).unwrap();
        let coins = trending_from_search(response);

        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].symbol, "PEPE");
        assert_eq!(coins[0].change_percent, Some(12.5));
        assert_eq!(coins[1].change_percent, None);
    }

    #[test]
    fn test_coin_details_from_response() {
        let body = r#"{
            "id": "bitcoin",
            "name": "Bitcoin",
            "market_cap_rank": 1,
            "links": {"homepage": ["", "https://bitcoin.org"]},
            "description": {"en": "Peer-to-peer cash."},
            "market_data": {
                "market_cap": {"usd": 1.2e12},
                "total_volume": {"usd": 3.0e10},
                "ath": {"usd": 73000.0},
                "circulating_supply": 19700000.0
            }
        }"#;
        let coin: CgCoin = serde_json::from_str(body).unwrap();
        let details = CoinDetails::from(coin);

        assert_eq!(details.name, "Bitcoin");
        assert_eq!(details.homepage.as_deref(), Some("https://bitcoin.org"));
        assert_eq!(details.market_cap_rank, Some(1));
        assert_eq!(details.all_time_high, Some(73000.0));
        assert_eq!(details.circulating_supply, Some(19_700_000.0));
    }
}
