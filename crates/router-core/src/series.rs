//! Time-series kinds and DataFrame helpers.
//!
//! Series are handed to the rendering layer as polars [`DataFrame`]s with the
//! columns `timestamp, open, high, low, close, volume`.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouterError};
use crate::types::OhlcvBar;

/// Which price history a caller wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    /// Bars since the last market open (equities) or the past day (crypto).
    Intraday,
    /// Daily bars covering the given number of calendar days.
    Daily {
        /// Calendar days of history.
        days: u32,
    },
}

impl SeriesKind {
    /// Returns true for intraday resolution.
    #[must_use]
    pub const fn is_intraday(&self) -> bool {
        matches!(self, Self::Intraday)
    }
}

/// Converts bars into the DataFrame layout shared by every provider.
///
/// Bars are written in the order given; providers pass them oldest first.
pub fn bars_to_frame(bars: &[OhlcvBar]) -> Result<DataFrame> {
    let timestamps: Vec<i64> = bars.iter().map(|b| b.timestamp.timestamp_millis()).collect();
    let timestamp_col = Column::new("timestamp".into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|e| RouterError::Other(e.to_string()))?;

    DataFrame::new(vec![
        timestamp_col,
        Column::new("open".into(), bars.iter().map(|b| b.open).collect::<Vec<_>>()),
        Column::new("high".into(), bars.iter().map(|b| b.high).collect::<Vec<_>>()),
        Column::new("low".into(), bars.iter().map(|b| b.low).collect::<Vec<_>>()),
        Column::new("close".into(), bars.iter().map(|b| b.close).collect::<Vec<_>>()),
        Column::new(
            "volume".into(),
            bars.iter().map(|b| b.volume).collect::<Vec<_>>(),
        ),
    ])
    .map_err(|e| RouterError::Other(e.to_string()))
}
