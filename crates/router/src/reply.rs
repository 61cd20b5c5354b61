//! Operations the router dispatches and the replies it produces.

use std::fmt;

use polars::prelude::DataFrame;
use router_core::{
    AssetClass, CoinDetails, CompanyProfile, DividendSchedule, KeyStats, NewsItem, Quote, Symbol,
};

/// A per-symbol request understood by [`SymbolRouter::dispatch`](crate::SymbolRouter::dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Latest price with percent change.
    Price,
    /// Dividend schedule. Equities only.
    Dividend,
    /// Recent headlines. Equities only.
    News,
    /// Company profile or coin description.
    Info,
    /// Key statistics.
    Stat,
    /// Market capitalization.
    Cap,
    /// Today's bars as a raw series.
    Intraday,
    /// Daily bars over the configured window as a raw series.
    Chart,
    /// One-line price and percent summary.
    Spark,
    /// Prices for many symbols, one provider round trip per asset class.
    BatchPrice,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Price,
        Self::Dividend,
        Self::News,
        Self::Info,
        Self::Stat,
        Self::Cap,
        Self::Intraday,
        Self::Chart,
        Self::Spark,
        Self::BatchPrice,
    ];

    /// Returns true if the operation makes sense for the asset class.
    #[must_use]
    pub const fn applies_to(&self, class: AssetClass) -> bool {
        match (self, class) {
            (Self::Dividend | Self::News, AssetClass::Crypto) => false,
            (_, AssetClass::Equity | AssetClass::Crypto) => true,
        }
    }

    /// Short lowercase label used in log fields and messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Price | Self::BatchPrice => "price",
            Self::Dividend => "dividend",
            Self::News => "news",
            Self::Info => "info",
            Self::Stat => "statistics",
            Self::Cap => "market cap",
            Self::Intraday => "intraday",
            Self::Chart => "chart",
            Self::Spark => "spark",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one operation for one symbol.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Display text.
    Text(String),
    /// Raw OHLCV series for the rendering layer.
    Series(DataFrame),
    /// The provider failed, timed out or had nothing to say.
    Unavailable(String),
    /// The operation is not defined for the symbol's asset class.
    NotApplicable(String),
}

impl Reply {
    /// The fixed reply for a provider failure.
    #[must_use]
    pub fn unavailable(op: Operation, symbol: &Symbol) -> Self {
        Self::Unavailable(format!(
            "{} data for {} is not currently available.",
            capitalize(op.label()),
            symbol.tag()
        ))
    }

    /// The fixed reply for an operation a class does not support.
    #[must_use]
    pub fn not_applicable(op: Operation, symbol: &Symbol) -> Self {
        let class = match symbol.asset_class() {
            AssetClass::Equity => "stocks",
            AssetClass::Crypto => "cryptocurrencies",
        };
        Self::NotApplicable(format!(
            "{} is not available for {class} such as {}.",
            capitalize(op.label()),
            symbol.tag()
        ))
    }

    /// Returns true for [`Reply::Text`] and [`Reply::Series`].
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Series(_))
    }

    /// The message carried by any non-series reply.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Unavailable(s) | Self::NotApplicable(s) => Some(s),
            Self::Series(_) => None,
        }
    }

    /// The series carried by a [`Reply::Series`].
    #[must_use]
    pub const fn series(&self) -> Option<&DataFrame> {
        match self {
            Self::Series(df) => Some(df),
            _ => None,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// ============================================================================
// Text rendering
// ============================================================================

/// Formats a USD amount with thousands separators. Sub-dollar amounts keep
/// enough decimals to show four significant digits.
pub(crate) fn usd(value: f64) -> String {
    if value.abs() >= 1.0 || value == 0.0 {
        let rounded = format!("{:.2}", value.abs());
        let (whole, frac) = rounded.split_once('.').unwrap_or((&rounded, "00"));
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{sign}${}.{frac}", group_thousands(whole))
    } else {
        let decimals = (4 - value.abs().log10().floor() as i32 - 1).clamp(2, 10) as usize;
        format!("${value:.decimals$}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Abbreviates large USD amounts (`$1.23T`, `$45.60B`).
pub(crate) fn usd_compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    UNITS
        .iter()
        .find(|(scale, _)| value.abs() >= *scale)
        .map_or_else(|| usd(value), |(scale, unit)| format!("${:.2}{unit}", value / scale))
}

fn change_phrase(change: f64) -> String {
    if change >= 0.0 {
        format!("up {change:.2}%")
    } else {
        format!("down {:.2}%", change.abs())
    }
}

pub(crate) fn price_text(symbol: &Symbol, quote: &Quote) -> String {
    let mut text = format!(
        "The current price of {} ({}) is {}",
        symbol.name(),
        symbol.tag(),
        usd(quote.price)
    );
    if let Some(change) = quote.change_percent {
        let window = match symbol.asset_class() {
            AssetClass::Equity => "today",
            AssetClass::Crypto => "in the last 24 hours",
        };
        text.push_str(&format!(", {} {window}", change_phrase(change)));
    }
    text.push('.');
    if quote.market_open == Some(false) {
        text.push_str(" The market is currently closed.");
    }
    text
}

pub(crate) fn spark_text(symbol: &Symbol, quote: &Quote) -> String {
    match quote.change_percent {
        Some(change) => format!("{}: {} ({change:+.2}%)", symbol.tag(), usd(quote.price)),
        None => format!("{}: {}", symbol.tag(), usd(quote.price)),
    }
}

pub(crate) fn cap_text(symbol: &Symbol, market_cap: f64) -> String {
    format!(
        "The market cap of {} ({}) is {}.",
        symbol.name(),
        symbol.tag(),
        usd_compact(market_cap)
    )
}

pub(crate) fn dividend_text(symbol: &Symbol, d: &DividendSchedule) -> String {
    let mut lines = vec![format!("Dividend for {} ({}):", symbol.name(), symbol.tag())];
    if let Some(rate) = d.rate {
        lines.push(format!("Annual rate: {} per share", usd(rate)));
    }
    if let Some(y) = d.yield_fraction {
        lines.push(format!("Yield: {:.2}%", y * 100.0));
    }
    if let Some(date) = d.ex_date {
        lines.push(format!("Ex-dividend date: {date}"));
    }
    if let Some(date) = d.pay_date {
        lines.push(format!("Payment date: {date}"));
    }
    lines.join("\n")
}

pub(crate) fn news_text(symbol: &Symbol, items: &[NewsItem]) -> String {
    let mut lines = vec![format!("News for {}:", symbol.tag())];
    lines.extend(items.iter().map(|item| match &item.publisher {
        Some(publisher) => format!("- {} ({publisher}) {}", item.title, item.url),
        None => format!("- {} {}", item.title, item.url),
    }));
    lines.join("\n")
}

pub(crate) fn profile_text(symbol: &Symbol, p: &CompanyProfile) -> String {
    let name = p.name.as_deref().unwrap_or_else(|| symbol.name());
    let mut lines = vec![format!("{name} ({})", symbol.tag())];
    if let Some(sector) = &p.sector {
        lines.push(format!("Sector: {sector}"));
    }
    if let Some(industry) = &p.industry {
        lines.push(format!("Industry: {industry}"));
    }
    if let Some(website) = &p.website {
        lines.push(format!("Website: {website}"));
    }
    if let Some(description) = &p.description {
        lines.push(String::new());
        lines.push(description.clone());
    }
    lines.join("\n")
}

pub(crate) fn coin_info_text(symbol: &Symbol, d: &CoinDetails) -> String {
    let mut lines = vec![format!("{} ({})", d.name, symbol.tag())];
    if let Some(rank) = d.market_cap_rank {
        lines.push(format!("Market cap rank: #{rank}"));
    }
    if let Some(homepage) = &d.homepage {
        lines.push(format!("Website: {homepage}"));
    }
    if let Some(description) = &d.description {
        lines.push(String::new());
        lines.push(description.clone());
    }
    lines.join("\n")
}

pub(crate) fn stats_text(symbol: &Symbol, s: &KeyStats) -> String {
    let rows = [
        ("Market cap", s.market_cap.map(usd_compact)),
        ("P/E ratio", s.pe_ratio.map(|v| format!("{v:.2}"))),
        ("Forward P/E", s.forward_pe.map(|v| format!("{v:.2}"))),
        ("Beta", s.beta.map(|v| format!("{v:.2}"))),
        ("52 week high", s.week_52_high.map(usd)),
        ("52 week low", s.week_52_low.map(usd)),
        ("Dividend yield", s.dividend_yield.map(|v| format!("{:.2}%", v * 100.0))),
    ];
    stat_lines(symbol, &rows)
}

pub(crate) fn coin_stats_text(symbol: &Symbol, d: &CoinDetails) -> String {
    let rows = [
        ("Market cap", d.market_cap.map(usd_compact)),
        ("Rank", d.market_cap_rank.map(|r| format!("#{r}"))),
        ("24h volume", d.total_volume.map(usd_compact)),
        ("All time high", d.all_time_high.map(usd)),
        ("Circulating supply", d.circulating_supply.map(|v| format!("{v:.0}"))),
    ];
    stat_lines(symbol, &rows)
}

fn stat_lines(symbol: &Symbol, rows: &[(&str, Option<String>)]) -> String {
    let mut lines = vec![format!("Statistics for {} ({}):", symbol.name(), symbol.tag())];
    lines.extend(
        rows.iter()
            .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}"))),
    );
    lines.join("\n")
}
