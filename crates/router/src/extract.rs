//! Ticker mention extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// `$` followed by up to six letters or dots, not itself preceded by `$`.
static EQUITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^$])\$([a-zA-Z.]{1,6})").expect("equity pattern is valid")
});

/// `$$` followed by up to twenty letters.
static CRYPTO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$([a-zA-Z]{1,20})").expect("crypto pattern is valid"));

/// Candidate tickers found in a message, split by asset class.
///
/// Candidates keep the case the user typed. Sets carry no order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Single-marker mentions, e.g. `tsla` from `$tsla`.
    pub equity: HashSet<String>,
    /// Double-marker mentions, e.g. `btc` from `$$btc`.
    pub crypto: HashSet<String>,
}

impl Candidates {
    /// Returns true when the text mentioned nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equity.is_empty() && self.crypto.is_empty()
    }
}

/// Scans free text for `$TICKER` and `$$COIN` mentions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolExtractor;

impl SymbolExtractor {
    /// Create a new extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extracts the de-duplicated candidates of both classes.
    #[must_use]
    pub fn extract(&self, text: &str) -> Candidates {
        let equity = EQUITY_PATTERN
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            // sentence punctuation: "$TSLA." or "$BRK.A."
            .map(|m| m.as_str().trim_end_matches('.'))
            .filter(|s| !s.is_empty() && !s.starts_with('.'))
            .map(str::to_string)
            .collect();

        let crypto = CRYPTO_PATTERN
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect();

        Candidates { equity, crypto }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(set: &HashSet<String>) -> Vec<&str> {
        let mut v: Vec<_> = set.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_mixed_message() {
        let found = SymbolExtractor::new().extract(
            "I wonder if $$btc will go to the Moon now that $tsla accepts it as payment",
        );
        assert_eq!(sorted(&found.equity), vec!["tsla"]);
        assert_eq!(sorted(&found.crypto), vec!["btc"]);
    }

    #[test]
    fn test_double_marker_is_not_equity() {
        let found = SymbolExtractor::new().extract("$$ETH");
        assert!(found.equity.is_empty());
        assert_eq!(sorted(&found.crypto), vec!["ETH"]);
    }

    #[test]
    fn test_dedup_keeps_case() {
        let found = SymbolExtractor::new().extract("$tsla $tsla $TSLA");
        assert_eq!(sorted(&found.equity), vec!["TSLA", "tsla"]);
    }

    #[test]
    fn test_dotted_and_trailing_punctuation() {
        let found = SymbolExtractor::new().extract("Buy $BRK.A. Or $AAPL.");
        assert_eq!(sorted(&found.equity), vec!["AAPL", "BRK.A"]);
    }

    #[test]
    fn test_length_limits() {
        let found = SymbolExtractor::new().extract("$ABCDEFGH and $$abcdefghijklmnopqrstuvwxyz");
        assert_eq!(sorted(&found.equity), vec!["ABCDEF"]);
        assert_eq!(sorted(&found.crypto), vec!["abcdefghijklmnopqrst"]);
    }

    #[test]
    fn test_no_mentions() {
        let extractor = SymbolExtractor::new();
        assert!(extractor.extract("costs $5 today").is_empty());
        assert!(extractor.extract("").is_empty());
    }
}
