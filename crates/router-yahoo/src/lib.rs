#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/router/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance equity data provider.
//!
//! This crate provides a Yahoo Finance data provider that implements the
//! [`DataProvider`] and [`EquityDataProvider`] traits from `router-core`.
//!
//! # Example
//!
//! ```no_run
//! use router_yahoo::YahooProvider;
//! use router_core::{DirectoryRecord, EquityDataProvider, Symbol};
//!
//! # async fn example() -> router_core::Result<()> {
//! let provider = YahooProvider::new();
//! let symbol = Symbol::equity("aapl", &DirectoryRecord::new("AAPL", "AAPL", "Apple Inc."));
//!
//! let quote = provider.quote(&symbol).await?;
//! println!("{} is at {}", symbol, quote.price);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use polars::prelude::DataFrame;
use router_core::{
    CompanyProfile, DataProvider, DividendSchedule, EquityDataProvider, KeyStats, NewsItem,
    OhlcvBar, Quote, Result, RouterError, SeriesKind, Symbol, bars_to_frame,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::debug;

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance spark API base URL, used for multi-symbol quotes.
const SPARK_API_URL: &str = "https://query1.finance.yahoo.com/v7/finance/spark";

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Yahoo Finance search API base URL, used for headlines.
const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 200;

/// Intraday bar interval.
const INTRADAY_INTERVAL: &str = "15m";

/// Symbol used to check that the API is reachable.
const PING_SYMBOL: &str = "SPY";

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Yahoo Finance data provider.
///
/// Implements [`DataProvider`] and [`EquityDataProvider`].
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Uses the provided client for all HTTP requests. Rate limiting
    /// is still applied.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            rate_limit_ms: rate_limit.as_millis() as u64,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let last = self.last_request_time.swap(now, Ordering::Relaxed);
        let elapsed = now.saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        self.apply_rate_limit().await;
        debug!("Yahoo request: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RouterError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RouterError::RateLimited {
                provider: "Yahoo Finance".to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RouterError::NoData(what.to_string()));
        }

        if !response.status().is_success() {
            return Err(RouterError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                what
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RouterError::Parse(e.to_string()))
    }

    /// Fetch the chart endpoint for a symbol.
    async fn fetch_chart(&self, symbol: &Symbol, kind: ChartRange) -> Result<ChartData> {
        let url = build_chart_url(symbol.id(), kind, Utc::now());
        let response: ChartResponse = self.get(&url, symbol.id()).await?;
        first_chart(symbol.id(), response)
    }

    /// Fetch quote summary modules for a symbol.
    async fn fetch_quote_summary(&self, symbol: &Symbol, modules: &str) -> Result<QuoteSummaryData> {
        let url = format!("{}/{}?modules={}", QUOTE_SUMMARY_URL, symbol.id(), modules);
        let summary: QuoteSummaryResponse = self.get(&url, symbol.id()).await?;
        summary
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| RouterError::NoData(symbol.id().to_string()))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance data provider for stock quotes, reference data and price history"
    }
}

#[async_trait]
impl EquityDataProvider for YahooProvider {
    async fn quote(&self, symbol: &Symbol) -> Result<Quote> {
        let chart = self.fetch_chart(symbol, ChartRange::Quote).await?;
        quote_from_meta(symbol.id(), &chart.meta, Utc::now())
    }

    async fn quotes(&self, symbols: &[Symbol]) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<&str> = symbols.iter().map(|s| s.id()).collect();
        let url = build_spark_url(&ids);
        let response: SparkResponse = self.get(&url, "batch quote").await?;
        Ok(parse_spark(response, Utc::now()))
    }

    async fn dividend(&self, symbol: &Symbol) -> Result<DividendSchedule> {
        let data = self
            .fetch_quote_summary(symbol, "calendarEvents,summaryDetail")
            .await?;
        let schedule = dividend_from_summary(&data);
        if schedule.is_empty() {
            return Err(RouterError::NoData(format!("dividend for {}", symbol.id())));
        }
        Ok(schedule)
    }

    async fn news(&self, symbol: &Symbol, limit: usize) -> Result<Vec<NewsItem>> {
        let url = format!(
            "{}?q={}&quotesCount=0&newsCount={}",
            SEARCH_URL,
            symbol.id(),
            limit
        );
        let response: SearchResponse = self.get(&url, symbol.id()).await?;
        let items = news_from_search(response, limit);
        if items.is_empty() {
            return Err(RouterError::NoData(format!("news for {}", symbol.id())));
        }
        Ok(items)
    }

    async fn profile(&self, symbol: &Symbol) -> Result<CompanyProfile> {
        let data = self.fetch_quote_summary(symbol, "assetProfile,price").await?;
        let profile = data.asset_profile.unwrap_or_default();
        let name = data.price.and_then(|p| p.long_name.or(p.short_name));

        Ok(CompanyProfile {
            name,
            sector: profile.sector,
            industry: profile.industry,
            website: profile.website,
            description: profile.long_business_summary,
        })
    }

    async fn key_stats(&self, symbol: &Symbol) -> Result<KeyStats> {
        let data = self
            .fetch_quote_summary(symbol, "summaryDetail,defaultKeyStatistics")
            .await?;
        Ok(stats_from_summary(&data))
    }

    async fn bars(&self, symbol: &Symbol, kind: SeriesKind) -> Result<DataFrame> {
        let range = match kind {
            SeriesKind::Intraday => ChartRange::Intraday,
            SeriesKind::Daily { days } => ChartRange::Daily { days },
        };
        let chart = self.fetch_chart(symbol, range).await?;
        let bars = bars_from_chart(&chart);
        if bars.is_empty() {
            return Err(RouterError::NoData(format!("bars for {}", symbol.id())));
        }
        bars_to_frame(&bars)
    }

    async fn ping(&self) -> Result<()> {
        let url = build_chart_url(PING_SYMBOL, ChartRange::Quote, Utc::now());
        let response: ChartResponse = self.get(&url, PING_SYMBOL).await?;
        first_chart(PING_SYMBOL, response).map(|_| ())
    }
}

// ============================================================================
// URL building and response parsing
// ============================================================================

/// Ranges requested from the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartRange {
    /// Single daily bar, used for its metadata.
    Quote,
    /// Today's bars including extended hours.
    Intraday,
    /// Daily bars for the past `days` calendar days.
    Daily { days: u32 },
}

/// Build the chart API URL for a symbol.
fn build_chart_url(id: &str, range: ChartRange, now: DateTime<Utc>) -> String {
    match range {
        ChartRange::Quote => format!("{CHART_API_URL}/{id}?range=1d&interval=1d"),
        ChartRange::Intraday => format!(
            "{CHART_API_URL}/{id}?range=1d&interval={INTRADAY_INTERVAL}&includePrePost=true"
        ),
        ChartRange::Daily { days } => {
            let end: NaiveDate = now.date_naive();
            let start = end - chrono::Duration::days(i64::from(days));

            let start_ts = start
                .and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
                .unwrap_or(0);

            let end_ts = end
                .and_hms_opt(23, 59, 59)
                .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
                .unwrap_or(0);

            format!("{CHART_API_URL}/{id}?period1={start_ts}&period2={end_ts}&interval=1d")
        }
    }
}

/// Build the spark API URL for several symbols.
fn build_spark_url(ids: &[&str]) -> String {
    format!(
        "{}?symbols={}&range=1d&interval=1d",
        SPARK_API_URL,
        ids.join(",")
    )
}

/// Extract the first chart result, mapping API-level errors.
fn first_chart(id: &str, response: ChartResponse) -> Result<ChartData> {
    if let Some(error) = response.chart.error {
        if error.code == "Not Found" {
            return Err(RouterError::NoData(id.to_string()));
        }
        return Err(RouterError::Other(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| RouterError::NoData(id.to_string()))
}

/// Build a quote from chart metadata.
fn quote_from_meta(id: &str, meta: &ChartMeta, now: DateTime<Utc>) -> Result<Quote> {
    let price = meta
        .regular_market_price
        .ok_or_else(|| RouterError::NoData(id.to_string()))?;

    let mut quote = Quote::new(price);

    if let Some(prev) = meta.chart_previous_close.or(meta.previous_close) {
        if prev != 0.0 {
            quote = quote.with_change_percent((price - prev) / prev * 100.0);
        }
    }

    if let Some(regular) = meta
        .current_trading_period
        .as_ref()
        .and_then(|p| p.regular.as_ref())
    {
        let ts = now.timestamp();
        quote = quote.with_market_open(regular.start <= ts && ts < regular.end);
    }

    Ok(quote)
}

/// Collect quotes from a spark response, keyed by symbol.
fn parse_spark(response: SparkResponse, now: DateTime<Utc>) -> HashMap<String, Quote> {
    let mut quotes = HashMap::new();
    for result in response.spark.result.unwrap_or_default() {
        let Some(chart) = result.response.into_iter().next() else {
            continue;
        };
        match quote_from_meta(&result.symbol, &chart.meta, now) {
            Ok(quote) => {
                quotes.insert(result.symbol, quote);
            }
            Err(e) => debug!(symbol = %result.symbol, error = %e, "No quote in spark result"),
        }
    }
    quotes
}

/// Convert chart arrays into bars, dropping rows with missing prices.
fn bars_from_chart(chart: &ChartData) -> Vec<OhlcvBar> {
    let Some(timestamps) = chart.timestamp.as_ref() else {
        return Vec::new();
    };
    let Some(quote) = chart.indicators.quote.first() else {
        return Vec::new();
    };

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            let open = quote.open.get(i).copied().flatten()?;
            let high = quote.high.get(i).copied().flatten()?;
            let low = quote.low.get(i).copied().flatten()?;
            let close = quote.close.get(i).copied().flatten()?;
            let bar = OhlcvBar::new(timestamp, open, high, low, close);
            Some(match quote.volume.get(i).copied().flatten() {
                Some(volume) => bar.with_volume(volume as f64),
                None => bar,
            })
        })
        .collect()
}

fn unix_date(ts: Option<i64>) -> Option<NaiveDate> {
    ts.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map(|dt| dt.date_naive())
}

fn dividend_from_summary(data: &QuoteSummaryData) -> DividendSchedule {
    let calendar = data.calendar_events.as_ref();
    let detail = data.summary_detail.as_ref();

    DividendSchedule {
        ex_date: unix_date(
            calendar
                .and_then(|c| c.ex_dividend_date.as_ref())
                .or_else(|| detail.and_then(|d| d.ex_dividend_date.as_ref()))
                .and_then(RawValue::as_i64),
        ),
        pay_date: unix_date(
            calendar
                .and_then(|c| c.dividend_date.as_ref())
                .and_then(RawValue::as_i64),
        ),
        rate: detail.and_then(|d| d.dividend_rate.as_ref()).and_then(|v| v.raw),
        yield_fraction: detail
            .and_then(|d| d.dividend_yield.as_ref())
            .and_then(|v| v.raw),
    }
}

fn stats_from_summary(data: &QuoteSummaryData) -> KeyStats {
    let detail = data.summary_detail.as_ref();
    let stats = data.default_key_statistics.as_ref();
    let raw = |v: Option<&RawValue>| v.and_then(|v| v.raw);

    KeyStats {
        market_cap: raw(detail.and_then(|d| d.market_cap.as_ref())),
        pe_ratio: raw(detail.and_then(|d| d.trailing_pe.as_ref())),
        forward_pe: raw(detail.and_then(|d| d.forward_pe.as_ref()))
            .or_else(|| raw(stats.and_then(|s| s.forward_pe.as_ref()))),
        beta: raw(detail.and_then(|d| d.beta.as_ref()))
            .or_else(|| raw(stats.and_then(|s| s.beta.as_ref()))),
        week_52_high: raw(detail.and_then(|d| d.fifty_two_week_high.as_ref())),
        week_52_low: raw(detail.and_then(|d| d.fifty_two_week_low.as_ref())),
        dividend_yield: raw(detail.and_then(|d| d.dividend_yield.as_ref())),
    }
}

fn news_from_search(response: SearchResponse, limit: usize) -> Vec<NewsItem> {
    response
        .news
        .into_iter()
        .take(limit)
        .map(|n| NewsItem {
            title: n.title,
            url: n.link,
            publisher: n.publisher,
            published_at: n
                .provider_publish_time
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        })
        .collect()
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    current_trading_period: Option<TradingPeriods>,
}

#[derive(Debug, Deserialize)]
struct TradingPeriods {
    regular: Option<TradingPeriod>,
}

#[derive(Debug, Deserialize)]
struct TradingPeriod {
    start: i64,
    end: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Spark API response.
#[derive(Debug, Deserialize)]
struct SparkResponse {
    spark: SparkResult,
}

#[derive(Debug, Deserialize)]
struct SparkResult {
    result: Option<Vec<SparkData>>,
}

#[derive(Debug, Deserialize)]
struct SparkData {
    symbol: String,
    #[serde(default)]
    response: Vec<ChartData>,
}

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<DefaultKeyStatistics>,
    calendar_events: Option<CalendarEvents>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`, or `{}` when absent.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

impl RawValue {
    fn as_i64(&self) -> Option<i64> {
        self.raw.map(|v| v as i64)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    website: Option<String>,
    long_business_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    beta: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
    dividend_rate: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    ex_dividend_date: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultKeyStatistics {
    forward_pe: Option<RawValue>,
    beta: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEvents {
    ex_dividend_date: Option<RawValue>,
    dividend_date: Option<RawValue>,
}

/// Search API response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    title: String,
    link: String,
    publisher: Option<String>,
    provider_publish_time: Option<i64>,
}
