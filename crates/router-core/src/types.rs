//! Core data types for resolved symbols and provider payloads.
//!
//! This module defines the fundamental data structures:
//!
//! - [`AssetClass`] - Equity or crypto
//! - [`Symbol`] - A symbol resolved against a directory
//! - [`Quote`] - Latest price and movement
//! - [`OhlcvBar`] - OHLCV price bar
//! - [`DividendSchedule`], [`NewsItem`], [`CompanyProfile`], [`KeyStats`] - Equity reference data
//! - [`CoinDetails`], [`TrendingCoin`] - Crypto reference data

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::directory::DirectoryRecord;

/// The two asset classes the router knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetClass {
    /// Listed stocks and funds.
    Equity,
    /// Cryptocurrencies.
    Crypto,
}

impl AssetClass {
    /// Every asset class, in dispatch order.
    pub const ALL: [Self; 2] = [Self::Equity, Self::Crypto];

    /// Returns the marker prefix users type in front of a symbol of this class.
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::Equity => "$",
            Self::Crypto => "$$",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equity => f.write_str("equity"),
            Self::Crypto => f.write_str("crypto"),
        }
    }
}

/// Identity of a resolved symbol.
///
/// Only constructible through [`Symbol::equity`] and [`Symbol::crypto`], so the
/// tag prefix can never disagree with the variant holding it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
    symbol: String,
    id: String,
    name: String,
    tag: String,
}

impl Listing {
    fn new(class: AssetClass, typed: &str, record: &DirectoryRecord) -> Self {
        Self {
            symbol: typed.to_string(),
            id: record.id.clone(),
            name: record.name.clone(),
            tag: format!("{}{}", class.marker(), record.symbol.to_uppercase()),
        }
    }
}

/// A symbol resolved against the current directory of its asset class.
///
/// Two symbols are equal when they share an asset class and canonical `id`,
/// regardless of how the user typed them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Symbol {
    /// A stock resolved against the equity directory.
    Equity(Listing),
    /// A coin resolved against the crypto directory.
    Crypto(Listing),
}

impl Symbol {
    /// Creates an equity symbol from the text the user typed and its directory record.
    #[must_use]
    pub fn equity(typed: &str, record: &DirectoryRecord) -> Self {
        Self::Equity(Listing::new(AssetClass::Equity, typed, record))
    }

    /// Creates a crypto symbol from the text the user typed and its directory record.
    #[must_use]
    pub fn crypto(typed: &str, record: &DirectoryRecord) -> Self {
        Self::Crypto(Listing::new(AssetClass::Crypto, typed, record))
    }

    /// Creates a symbol of the given class.
    #[must_use]
    pub fn new(class: AssetClass, typed: &str, record: &DirectoryRecord) -> Self {
        match class {
            AssetClass::Equity => Self::equity(typed, record),
            AssetClass::Crypto => Self::crypto(typed, record),
        }
    }

    const fn listing(&self) -> &Listing {
        match self {
            Self::Equity(listing) | Self::Crypto(listing) => listing,
        }
    }

    /// Returns the asset class of this symbol.
    #[must_use]
    pub const fn asset_class(&self) -> AssetClass {
        match self {
            Self::Equity(_) => AssetClass::Equity,
            Self::Crypto(_) => AssetClass::Crypto,
        }
    }

    /// The symbol as the user typed it (e.g. `tsla`).
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.listing().symbol
    }

    /// The canonical id the provider expects (e.g. `TSLA` or `bitcoin`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.listing().id
    }

    /// Human readable name (e.g. `Tesla, Inc.`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.listing().name
    }

    /// Marker-prefixed display form (e.g. `$TSLA` or `$$BTC`).
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.listing().tag
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.asset_class() == other.asset_class() && self.id() == other.id()
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.asset_class().hash(state);
        self.id().hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Latest price and movement for a symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Last traded price in USD.
    pub price: f64,
    /// Percent change over the session (equities) or the past 24 hours (crypto).
    pub change_percent: Option<f64>,
    /// Whether the primary market is currently open. Unknown for crypto.
    pub market_open: Option<bool>,
    /// Market capitalization, when the provider reports it alongside the price.
    pub market_cap: Option<f64>,
}

impl Quote {
    /// Creates a quote with only a price.
    #[must_use]
    pub const fn new(price: f64) -> Self {
        Self {
            price,
            change_percent: None,
            market_open: None,
            market_cap: None,
        }
    }

    /// Sets the percent change.
    #[must_use]
    pub const fn with_change_percent(mut self, change_percent: f64) -> Self {
        self.change_percent = Some(change_percent);
        self
    }

    /// Sets the market-open flag.
    #[must_use]
    pub const fn with_market_open(mut self, market_open: bool) -> Self {
        self.market_open = Some(market_open);
        self
    }

    /// Sets the market capitalization.
    #[must_use]
    pub const fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }
}

/// OHLCV (Open, High, Low, Close, Volume) bar data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    /// Timestamp of the bar.
    pub timestamp: DateTime<Utc>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume, when the provider reports it.
    pub volume: Option<f64>,
}

impl OhlcvBar {
    /// Creates a new OHLC bar without volume.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Sets the traded volume.
    #[must_use]
    pub const fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Upcoming or most recent dividend of a stock.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendSchedule {
    /// Ex-dividend date.
    pub ex_date: Option<NaiveDate>,
    /// Payment date.
    pub pay_date: Option<NaiveDate>,
    /// Annual dividend per share.
    pub rate: Option<f64>,
    /// Dividend yield as a fraction.
    pub yield_fraction: Option<f64>,
}

impl DividendSchedule {
    /// Returns true if the schedule carries no usable information.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ex_date.is_none() && self.pay_date.is_none() && self.rate.is_none()
    }
}

/// A single news headline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline.
    pub title: String,
    /// Link to the article.
    pub url: String,
    /// Publisher name.
    pub publisher: Option<String>,
    /// Publication time.
    pub published_at: Option<DateTime<Utc>>,
}

/// Company reference information.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Company name.
    pub name: Option<String>,
    /// Business sector.
    pub sector: Option<String>,
    /// Industry within the sector.
    pub industry: Option<String>,
    /// Company website.
    pub website: Option<String>,
    /// Business description.
    pub description: Option<String>,
}

/// Key statistics for a stock.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Trailing price-to-earnings ratio.
    pub pe_ratio: Option<f64>,
    /// Forward price-to-earnings ratio.
    pub forward_pe: Option<f64>,
    /// Beta coefficient.
    pub beta: Option<f64>,
    /// 52-week high price.
    pub week_52_high: Option<f64>,
    /// 52-week low price.
    pub week_52_low: Option<f64>,
    /// Dividend yield as a fraction.
    pub dividend_yield: Option<f64>,
}

/// Description and statistics for a coin.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinDetails {
    /// Coin name.
    pub name: String,
    /// Project homepage.
    pub homepage: Option<String>,
    /// English description, possibly containing HTML.
    pub description: Option<String>,
    /// Market capitalization in USD.
    pub market_cap: Option<f64>,
    /// Rank by market capitalization.
    pub market_cap_rank: Option<u32>,
    /// 24 hour trading volume in USD.
    pub total_volume: Option<f64>,
    /// All time high in USD.
    pub all_time_high: Option<f64>,
    /// Circulating supply.
    pub circulating_supply: Option<f64>,
}

/// A coin from a provider's trending list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendingCoin {
    /// Provider id.
    pub id: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Percent change over the past 24 hours.
    pub change_percent: Option<f64>,
}
