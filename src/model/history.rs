use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily close of an underlying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceHistoryBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Daily closes ordered ascending by date, one bar per trading day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    bars: Vec<PriceHistoryBar>,
}

impl PriceHistory {
    /// Sorts by date and drops later bars that repeat an earlier date.
    pub fn new(mut bars: Vec<PriceHistoryBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceHistoryBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.close)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

impl FromIterator<PriceHistoryBar> for PriceHistory {
    fn from_iter<I: IntoIterator<Item = PriceHistoryBar>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_and_drops_repeated_dates() {
        let d1 = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 12, 2).unwrap();
        let history = PriceHistory::new(vec![
            PriceHistoryBar::new(d2, 101.0),
            PriceHistoryBar::new(d1, 100.0),
            PriceHistoryBar::new(d2, 999.0),
        ]);

        assert_eq!(history.len(), 2);
        assert_eq!(history.closes().collect::<Vec<_>>(), vec![100.0, 101.0]);
        assert_eq!(history.last_close(), Some(101.0));
    }
}
