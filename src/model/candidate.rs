use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A bull put credit spread built from two adjacent strikes of one expiration.
///
/// The short leg is the higher strike (sold), the long leg the lower strike (bought).
/// Candidates are only produced with `width > 0`, `credit > 0` and `risk > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSpreadCandidate {
    pub short_strike: f64,
    pub long_strike: f64,
    pub expiration: NaiveDate,
    pub days_to_expiration: i64,
    pub short_bid: f64,
    pub long_ask: f64,
    /// Net premium collected per share, rounded to 3 decimals.
    pub credit: f64,
    pub width: f64,
    /// Maximum loss per share: `width - credit`.
    pub risk: f64,
    /// `credit / risk`, rounded to 2 decimals.
    pub reward_to_risk: f64,
    pub breakeven: f64,
    /// Heuristic probability of profit, in percent.
    pub probability_of_profit: u32,
}
