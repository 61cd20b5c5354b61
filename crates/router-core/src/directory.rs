//! Directory snapshots of resolvable symbols.
//!
//! A [`Directory`] is immutable once built. Refreshing a directory means
//! building a new snapshot and swapping it in whole, so readers never see a
//! half-updated list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::AssetClass;

/// One entry of a symbol directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Canonical provider id (`TSLA`, `bitcoin`).
    pub id: String,
    /// Ticker symbol as listed by the source (`TSLA`, `btc`).
    pub symbol: String,
    /// Display name.
    pub name: String,
}

impl DirectoryRecord {
    /// Creates a new directory record.
    #[must_use]
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Immutable snapshot of the known symbols of one asset class.
///
/// Records keep the order the source delivered them in. Symbol lookups are
/// case-insensitive and return matches in that order.
#[derive(Clone, Debug)]
pub struct Directory {
    class: AssetClass,
    records: Vec<DirectoryRecord>,
    by_symbol: HashMap<String, Vec<usize>>,
    /// Lowercased description of each record, parallel to `records`.
    search_text: Vec<String>,
    fetched_at: DateTime<Utc>,
}

impl Directory {
    /// Builds a snapshot from records in source order.
    #[must_use]
    pub fn new(class: AssetClass, records: Vec<DirectoryRecord>) -> Self {
        let mut by_symbol: HashMap<String, Vec<usize>> = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            by_symbol
                .entry(record.symbol.to_uppercase())
                .or_default()
                .push(idx);
        }

        let search_text = records
            .iter()
            .map(|record| describe(class, record).to_lowercase())
            .collect();

        Self {
            class,
            records,
            by_symbol,
            search_text,
            fetched_at: Utc::now(),
        }
    }

    /// An empty snapshot, served until the first successful refresh.
    #[must_use]
    pub fn empty(class: AssetClass) -> Self {
        Self::new(class, Vec::new())
    }

    /// Returns the asset class this directory describes.
    #[must_use]
    pub const fn asset_class(&self) -> AssetClass {
        self.class
    }

    /// Returns when this snapshot was built.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the directory holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns all records in source order.
    #[must_use]
    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    /// Returns every record whose symbol matches `symbol`, ignoring case, in source order.
    pub fn find_all<'a>(
        &'a self,
        symbol: &str,
    ) -> impl Iterator<Item = &'a DirectoryRecord> + use<'a> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .into_iter()
            .flatten()
            .map(move |&idx| &self.records[idx])
    }

    /// Returns the first record whose symbol matches `symbol`, ignoring case.
    #[must_use]
    pub fn find(&self, symbol: &str) -> Option<&DirectoryRecord> {
        self.find_all(symbol).next()
    }

    /// Derived display line for a record, e.g. `$$BTC: Bitcoin`.
    #[must_use]
    pub fn description(&self, record: &DirectoryRecord) -> String {
        describe(self.class, record)
    }

    /// Records whose description contains `query`, ignoring case, in source order.
    pub fn search<'a>(
        &'a self,
        query: &str,
    ) -> impl Iterator<Item = &'a DirectoryRecord> + use<'a> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .zip(&self.search_text)
            .filter(move |(_, text)| text.contains(&needle))
            .map(|(record, _)| record)
    }
}

fn describe(class: AssetClass, record: &DirectoryRecord) -> String {
    format!(
        "{}{}: {}",
        class.marker(),
        record.symbol.to_uppercase(),
        record.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins() -> Directory {
        Directory::new(
            AssetClass::Crypto,
            vec![
                DirectoryRecord::new("bitcoin", "btc", "Bitcoin"),
                DirectoryRecord::new("ethereum", "eth", "Ethereum"),
                DirectoryRecord::new("bitcoin-2", "btc", "Bitcoin 2"),
            ],
        )
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let dir = coins();
        assert_eq!(dir.find("BTC").map(|r| r.id.as_str()), Some("bitcoin"));
        assert_eq!(dir.find("eTh").map(|r| r.id.as_str()), Some("ethereum"));
        assert!(dir.find("doge").is_none());
    }

    #[test]
    fn test_find_all_keeps_source_order() {
        let dir = coins();
        let ids: Vec<_> = dir.find_all("btc").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "bitcoin-2"]);
    }

    #[test]
    fn test_description() {
        let dir = coins();
        assert_eq!(dir.description(&dir.records()[0]), "$$BTC: Bitcoin");

        let stocks = Directory::new(
            AssetClass::Equity,
            vec![DirectoryRecord::new("TSLA", "TSLA", "Tesla, Inc.")],
        );
        assert_eq!(stocks.description(&stocks.records()[0]), "$TSLA: Tesla, Inc.");
    }

    #[test]
    fn test_search() {
        let dir = coins();
        let ids: Vec<_> = dir.search("bitcoin").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "bitcoin-2"]);
        assert_eq!(dir.search("$$ETH").count(), 1);
    }

    #[test]
    fn test_search_matches_every_description() {
        let dir = Directory::new(
            AssetClass::Equity,
            vec![
                DirectoryRecord::new("TSLA", "tsla", "Tesla, Inc."),
                DirectoryRecord::new("BRK-A", "BRK-A", "Berkshire Hathaway Inc."),
            ],
        );

        for record in dir.records() {
            let description = dir.description(record);
            let found: Vec<_> = dir.search(&description.to_uppercase()).collect();
            assert_eq!(found, vec![record], "{description}");
        }
        assert_eq!(dir.search("inc.").count(), 2);
        assert_eq!(dir.search("$tsla: tes").count(), 1);
        assert_eq!(dir.search("tesla, inc. ").count(), 0);
    }

    #[test]
    fn test_empty() {
        let dir = Directory::empty(AssetClass::Equity);
        assert!(dir.is_empty());
        assert_eq!(dir.len(), 0);
        assert_eq!(dir.asset_class(), AssetClass::Equity);
    }
}
