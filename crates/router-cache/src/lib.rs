#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/router/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for the symbol router.
//!
//! - [`DirectoryCache`] - Atomically swapped directory snapshots, serve-stale-on-error
//! - [`SeriesCache`] - Lazily populated OHLCV frames, cleared wholesale on schedule
//! - [`ReplyCache`] - Bounded computed-reply cache with a sliding TTL

/// Directory snapshot cache.
pub mod directory;
/// Computed-reply cache.
pub mod reply;
/// Time-series cache.
pub mod series;

pub use directory::DirectoryCache;
pub use reply::ReplyCache;
pub use series::SeriesCache;
