//! Decaying popularity counter over symbol tags.

use std::cmp::Ordering;
use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Concurrency-safe `tag -> weight` map.
///
/// Weights only grow through [`record`](Self::record) and only shrink through
/// [`decay`](Self::decay). An entry pruned by decay is gone until the tag is
/// recorded again.
#[derive(Debug, Default)]
pub struct TrendingTracker {
    weights: RwLock<HashMap<String, f64>>,
}

impl TrendingTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight` to `tag`. Non-positive and non-finite weights are ignored.
    pub async fn record(&self, tag: &str, weight: f64) {
        if !(weight.is_finite() && weight > 0.0) {
            return;
        }
        let mut weights = self.weights.write().await;
        *weights.entry(tag.to_string()).or_insert(0.0) += weight;
    }

    /// Multiplies every weight by `factor`, then drops entries below `floor`.
    ///
    /// Returns the number of entries pruned.
    #[instrument(skip(self))]
    pub async fn decay(&self, factor: f64, floor: f64) -> usize {
        let mut weights = self.weights.write().await;
        let before = weights.len();
        weights.retain(|_, w| {
            *w *= factor;
            *w >= floor
        });
        let pruned = before - weights.len();
        debug!(remaining = weights.len(), pruned, "Decayed trending weights");
        pruned
    }

    /// The `n` heaviest tags, heaviest first, ties in lexical tag order.
    pub async fn top_k(&self, n: usize) -> Vec<(String, f64)> {
        let weights = self.weights.read().await;
        let mut ranked: Vec<(String, f64)> = weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(tag, w)| (tag.clone(), *w))
            .collect();
        drop(weights);

        ranked.sort_by(|(ta, wa), (tb, wb)| {
            wb.partial_cmp(wa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ta.cmp(tb))
        });
        ranked.truncate(n);
        ranked
    }

    /// Current weight of a tag, if tracked.
    pub async fn weight(&self, tag: &str) -> Option<f64> {
        self.weights.read().await.get(tag).copied()
    }

    /// Number of tracked tags.
    pub async fn len(&self) -> usize {
        self.weights.read().await.len()
    }

    /// Returns true if no tag is tracked.
    pub async fn is_empty(&self) -> bool {
        self.weights.read().await.is_empty()
    }
}
