#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/router/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR ticker directory source.
//!
//! # Example
//!
//! ```no_run
//! use router_edgar::EdgarDirectory;
//! use router_core::DirectorySource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = EdgarDirectory::new("MyApp/1.0 (contact@example.com)");
//!     let directory = source.fetch_directory().await?;
//!     println!("{} tickers", directory.len());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use router_core::{
    AssetClass, DataProvider, Directory, DirectoryRecord, DirectorySource, Result, RouterError,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// SEC company tickers URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// HTTP timeout for the bulk download.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Equity directory source backed by the SEC ticker list.
#[derive(Debug)]
pub struct EdgarDirectory {
    client: reqwest::Client,
    url: String,
}

impl EdgarDirectory {
    /// Create a new source with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use router_edgar::EdgarDirectory;
    ///
    /// let source = EdgarDirectory::new("MyApp/1.0 (contact@example.com)");
    /// ```
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(client)
    }

    /// Create a new source with a pre-configured HTTP client.
    ///
    /// The client must already carry an identifying user agent.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            url: COMPANY_TICKERS_URL.to_string(),
        }
    }

    /// Point the source at a different URL (mirrors, tests).
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl DataProvider for EdgarDirectory {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn description(&self) -> &str {
        "SEC EDGAR company ticker list"
    }
}

#[async_trait]
impl DirectorySource for EdgarDirectory {
    fn asset_class(&self) -> AssetClass {
        AssetClass::Equity
    }

    async fn fetch_directory(&self) -> Result<Directory> {
        debug!("Fetching company tickers from SEC");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RouterError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RouterError::RateLimited {
                provider: self.name().to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            return Err(RouterError::Network(format!(
                "Failed to fetch company tickers: HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RouterError::Network(e.to_string()))?;

        let directory = parse_company_tickers(&body)?;
        debug!("Loaded {} tickers from SEC", directory.len());
        Ok(directory)
    }
}

/// Parses the SEC ticker list into a directory ordered by the list's rank keys.
fn parse_company_tickers(body: &str) -> Result<Directory> {
    let data: HashMap<String, CompanyTickerInfo> = serde_json::from_str(body)
        .map_err(|e| RouterError::Parse(format!("Failed to parse company tickers: {e}")))?;

    let mut ranked: Vec<(u64, CompanyTickerInfo)> = data
        .into_iter()
        .filter_map(|(rank, info)| rank.parse::<u64>().ok().map(|rank| (rank, info)))
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);

    let records = ranked
        .into_iter()
        .map(|(_, info)| {
            let ticker = info.ticker.to_uppercase();
            DirectoryRecord::new(ticker.clone(), ticker, info.title)
        })
        .collect();

    Ok(Directory::new(AssetClass::Equity, records))
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// Ticker symbol
    ticker: String,
    /// Company name
    title: String,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"},
        "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "10": {"cik_str": 1318605, "ticker": "TSLA", "title": "Tesla, Inc."},
        "2": {"cik_str": 1067983, "ticker": "brk-b", "title": "BERKSHIRE HATHAWAY INC"}
    }"#;

    #[test]
    fn test_parse_orders_by_rank() {
        let dir = parse_company_tickers(FIXTURE).unwrap();
        let ids: Vec<_> = dir.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["AAPL", "MSFT", "BRK-B", "TSLA"]);
        assert_eq!(dir.asset_class(), AssetClass::Equity);
    }

    #[test]
    fn test_parse_lookup() {
        let dir = parse_company_tickers(FIXTURE).unwrap();
        let tsla = dir.find("tsla").unwrap();
        assert_eq!(tsla.name, "Tesla, Inc.");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_company_tickers("<html>"),
            Err(RouterError::Parse(_))
        ));
    }

    #[test]
    fn test_provider_traits() {
        let source = EdgarDirectory::new("Test/1.0 (test@example.com)");
        assert_eq!(source.name(), "SEC EDGAR");
        assert_eq!(source.asset_class(), AssetClass::Equity);
        assert!(!source.description().is_empty());
    }
}
