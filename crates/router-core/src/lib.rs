#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/router/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the symbol router.
//!
//! This crate provides the foundational abstractions shared by every router crate:
//!
//! - [`Symbol`](types::Symbol) - Resolved equity or crypto symbol
//! - [`Directory`](directory::Directory) - Snapshot of known symbols for one asset class
//! - [`EquityDataProvider`](provider::EquityDataProvider) - Quotes, dividends, news and bars for stocks
//! - [`CryptoDataProvider`](provider::CryptoDataProvider) - Prices, details and bars for coins
//! - [`DirectorySource`](provider::DirectorySource) - Bulk symbol lists

/// Directory snapshots of resolvable symbols.
pub mod directory;
/// Error types for router operations.
pub mod error;
/// Provider traits for fetching market data.
pub mod provider;
/// Time-series kinds and DataFrame helpers.
pub mod series;
/// Core data types (Symbol, Quote, OhlcvBar, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use directory::{Directory, DirectoryRecord};
pub use error::{Result, RouterError};
pub use provider::{
    BATCH_QUOTE_TIMEOUT, CryptoDataProvider, DataProvider, DirectorySource, EquityDataProvider,
};
pub use series::{SeriesKind, bars_to_frame};
pub use types::{
    AssetClass, CoinDetails, CompanyProfile, DividendSchedule, KeyStats, NewsItem, OhlcvBar,
    Quote, Symbol, TrendingCoin,
};
