//! Candidate validation against directory snapshots.

use std::collections::HashSet;

use router_core::{AssetClass, Directory, DirectoryRecord, Symbol};
use tracing::{debug, info};

use crate::extract::Candidates;

/// Turns extracted candidates into [`Symbol`]s.
///
/// Equities match the ticker exactly, ignoring case. Dotted share classes also
/// match the dashed form used by the SEC list (`BRK.A` finds `BRK-A`). Coins
/// match the coin ticker, ignoring case. When several coins share a ticker the
/// first one in directory order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolResolver;

impl SymbolResolver {
    /// Create a new resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves candidates against the given snapshots.
    ///
    /// Unknown candidates are dropped. The result holds each resolved symbol
    /// once, equities first, each class ordered by upper-cased candidate text.
    #[must_use]
    pub fn resolve(
        &self,
        candidates: &Candidates,
        equities: &Directory,
        coins: &Directory,
    ) -> Vec<Symbol> {
        let mut seen = HashSet::new();
        let mut symbols = Vec::new();

        for typed in sorted(&candidates.equity) {
            if let Some(record) = self.lookup_equity(equities, typed) {
                let symbol = Symbol::equity(typed, record);
                if seen.insert(symbol.clone()) {
                    symbols.push(symbol);
                }
            }
        }

        for typed in sorted(&candidates.crypto) {
            if let Some(record) = self.lookup_coin(coins, typed) {
                let symbol = Symbol::crypto(typed, record);
                if seen.insert(symbol.clone()) {
                    symbols.push(symbol);
                }
            }
        }

        symbols
    }

    fn lookup_equity<'a>(
        &self,
        directory: &'a Directory,
        typed: &str,
    ) -> Option<&'a DirectoryRecord> {
        let found = directory.find(typed).or_else(|| {
            typed
                .contains('.')
                .then(|| directory.find(&typed.replace('.', "-")))
                .flatten()
        });
        if found.is_none() {
            debug!(candidate = typed, class = %AssetClass::Equity, "Unknown symbol");
        }
        found
    }

    fn lookup_coin<'a>(
        &self,
        directory: &'a Directory,
        typed: &str,
    ) -> Option<&'a DirectoryRecord> {
        let mut matches = directory.find_all(typed);
        let Some(first) = matches.next() else {
            debug!(candidate = typed, class = %AssetClass::Crypto, "Unknown symbol");
            return None;
        };

        let others: Vec<&str> = matches.map(|r| r.id.as_str()).collect();
        if !others.is_empty() {
            info!(
                candidate = typed,
                chosen = %first.id,
                skipped = ?others,
                "Ambiguous coin ticker, using first listing"
            );
        }
        Some(first)
    }
}

fn sorted(set: &HashSet<String>) -> Vec<&str> {
    let mut v: Vec<&str> = set.iter().map(String::as_str).collect();
    v.sort_by(|a, b| a.to_uppercase().cmp(&b.to_uppercase()).then_with(|| a.cmp(b)));
    v
}
