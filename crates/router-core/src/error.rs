//! Error types for router operations.
//!
//! This module defines [`RouterError`] which covers every failure a provider or
//! directory source can report. The router itself never lets these escape a
//! per-symbol dispatch; they are collapsed into display values at that boundary.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while fetching market data or symbol directories.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Transport failures and non-success HTTP statuses.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider did not answer within the configured bound.
    #[error("{provider} timed out after {after:?}")]
    Timeout {
        /// The provider that timed out.
        provider: String,
        /// How long the call was allowed to run.
        after: Duration,
    },

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The provider answered but has no data for the request.
    #[error("No data available for {0}")]
    NoData(String),

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No directory snapshot could be obtained for any asset class.
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The requested feature is not supported.
    #[error("Feature not supported: {0}")]
    NotSupported(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl RouterError {
    /// Returns true if the provider reported an empty result rather than a failure.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData(_))
    }
}

/// Result type alias using [`RouterError`].
pub type Result<T> = std::result::Result<T, RouterError>;
