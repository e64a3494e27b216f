//! Realized-volatility percentile rank.
//!
//! Stands in for an implied-volatility rank when no IV history is available:
//! the rank is the percentile of today's 20-day realized volatility within its
//! own trailing history. It is *not* implied volatility.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::PriceHistory;

/// Returns per rolling realized-volatility window.
pub const WINDOW: usize = 20;
/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS: f64 = 252.0;
/// One full window of returns plus the bar that seeds the first return.
pub const MIN_BARS: usize = WINDOW + 1;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VolatilityError {
    #[error("insufficient price history: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("close at index {index} is not a positive finite price")]
    InvalidClose { index: usize },
}

/// Percentile rank in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VolatilityRank(u8);

impl VolatilityRank {
    pub fn new(value: u8) -> Option<Self> {
        (value <= 100).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for VolatilityRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rank today's realized volatility against the trailing history.
///
/// If every reading is equal the rank is 100: today ties every reading, itself included.
pub fn estimate(history: &PriceHistory) -> Result<VolatilityRank, VolatilityError> {
    let hv = rolling_volatility(history)?;
    let Some(&current) = hv.last() else {
        return Err(VolatilityError::InsufficientData {
            required: MIN_BARS,
            available: history.len(),
        });
    };

    let at_or_below = hv.iter().filter(|&&v| v <= current).count();
    let rank = (100.0 * at_or_below as f64 / hv.len() as f64).round();
    Ok(VolatilityRank(rank.clamp(0.0, 100.0) as u8))
}

/// Annualized rolling realized volatility in percent, one reading per full window.
///
/// The output is `WINDOW` entries shorter than the input.
pub fn rolling_volatility(history: &PriceHistory) -> Result<Vec<f64>, VolatilityError> {
    if history.len() < MIN_BARS {
        return Err(VolatilityError::InsufficientData {
            required: MIN_BARS,
            available: history.len(),
        });
    }

    let returns = daily_returns(history)?;
    let annualize = TRADING_DAYS.sqrt() * 100.0;

    Ok(returns
        .windows(WINDOW)
        .map(|w| sample_std(w) * annualize)
        .collect())
}

/// Simple returns `close[i] / close[i-1] - 1`.
fn daily_returns(history: &PriceHistory) -> Result<Vec<f64>, VolatilityError> {
    let closes: Vec<f64> = history.closes().collect();
    let mut returns = Vec::with_capacity(closes.len().saturating_sub(1));

    for (i, pair) in closes.windows(2).enumerate() {
        let (prev, next) = (pair[0], pair[1]);
        if !(prev.is_finite() && prev > 0.0) {
            return Err(VolatilityError::InvalidClose { index: i });
        }
        if !next.is_finite() {
            return Err(VolatilityError::InvalidClose { index: i + 1 });
        }
        returns.push(next / prev - 1.0);
    }

    Ok(returns)
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_std() {
        let s = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((s - 2.138089935).abs() < 1e-6);
        assert_eq!(sample_std(&[1.0]), 0.0);
    }

    #[test]
    fn test_rank_bounds() {
        assert!(VolatilityRank::new(100).is_some());
        assert!(VolatilityRank::new(101).is_none());
    }
}
