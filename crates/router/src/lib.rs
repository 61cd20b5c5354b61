#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/router/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Ticker mentions in, market data replies out.
//!
//! This crate ties the workspace together. It re-exports the core types and
//! provider implementations, and provides a [`SymbolRouter`] that extracts
//! `$TICKER` and `$$COIN` mentions from free text, validates them against
//! periodically refreshed directories, and serves per-symbol replies from the
//! configured equity and crypto providers.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance equity provider
//! - `edgar` - SEC company ticker list as the equity directory
//! - `coingecko` - CoinGecko crypto provider and coin directory
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use router::{Operation, RouterConfig, Scheduler, SymbolRouter};
//!
//! #[tokio::main]
//! async fn main() -> router::Result<()> {
//!     let router = Arc::new(
//!         SymbolRouter::builder()
//!             .config(RouterConfig::from_env()?)
//!             .with_yahoo()
//!             .with_edgar("MyBot/1.0 (ops@example.com)")
//!             .with_coingecko(std::env::var("COINGECKO_API_KEY").ok())
//!             .build()?,
//!     );
//!     router.start().await?;
//!     let _scheduler = Scheduler::start(Arc::clone(&router));
//!
//!     let symbols = router.resolve("$$btc or $tsla?", 1.0).await;
//!     for reply in router.dispatch(Operation::Price, &symbols).await {
//!         if let Some(text) = reply.text() {
//!             println!("{text}");
//!         }
//!     }
//!     println!("{}", router.trending_reply().await);
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use router_core::*;

// Caches
pub use router_cache::{DirectoryCache, ReplyCache, SeriesCache};

// Providers
#[cfg(feature = "coingecko")]
pub use router_coingecko::CoinGeckoProvider;
#[cfg(feature = "edgar")]
pub use router_edgar::EdgarDirectory;
#[cfg(feature = "yahoo")]
pub use router_yahoo::YahooProvider;

mod config;
pub use config::RouterConfig;

mod extract;
pub use extract::{Candidates, SymbolExtractor};

mod resolve;
pub use resolve::SymbolResolver;

mod trending;
pub use trending::TrendingTracker;

mod reply;
pub use reply::{Operation, Reply};

mod router;
pub use router::{
    DirectoryStatus, ProviderStatus, RouterStatus, SearchHit, SymbolRouter, SymbolRouterBuilder,
    TRENDING_UNAVAILABLE,
};

mod scheduler;
pub use scheduler::{JobOutcome, Scheduler};

#[cfg(test)]
mod mock;
