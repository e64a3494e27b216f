use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::PriceHistoryBar;

/// One daily close, as stored in `<ticker>_history.csv`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HistoryCsvRow {
    pub date: NaiveDate,
    pub close: f64,
}

impl From<HistoryCsvRow> for PriceHistoryBar {
    fn from(row: HistoryCsvRow) -> Self {
        PriceHistoryBar::new(row.date, row.close)
    }
}

impl From<&PriceHistoryBar> for HistoryCsvRow {
    fn from(bar: &PriceHistoryBar) -> Self {
        HistoryCsvRow {
            date: bar.date,
            close: bar.close,
        }
    }
}

/// One put quote, as stored in `<ticker>_puts.csv`.
///
/// Days to expiration is not stored; it is recomputed against the manifest's `as_of` date.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PutCsvRow {
    pub strike: f64,
    pub expiration: NaiveDate,
    pub bid: f64,
    pub ask: f64,
}
