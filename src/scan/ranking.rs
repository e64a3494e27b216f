use std::cmp::Ordering;

use crate::model::{ScanConfig, ScanResult};

/// Ordering score: reward:risk, plus the preferred-set bonus when the bias is on.
pub fn score(config: &ScanConfig, ticker: &str, reward_to_risk: f64) -> f64 {
    if config.favor_preferred_set && config.is_preferred(ticker) {
        reward_to_risk + config.preferred_bonus
    } else {
        reward_to_risk
    }
}

/// Best-first total order over results.
///
/// Score descending, then reward:risk descending, then POP descending, then
/// ticker ascending, then short strike descending, then expiration ascending.
pub fn compare(a: &ScanResult, b: &ScanResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.spread.reward_to_risk.total_cmp(&a.spread.reward_to_risk))
        .then_with(|| b.spread.probability_of_profit.cmp(&a.spread.probability_of_profit))
        .then_with(|| a.ticker.cmp(&b.ticker))
        .then_with(|| b.spread.short_strike.total_cmp(&a.spread.short_strike))
        .then_with(|| a.spread.expiration.cmp(&b.spread.expiration))
}

/// Sort best-first and keep at most `limit` rows.
pub fn top(mut results: Vec<ScanResult>, limit: usize) -> Vec<ScanResult> {
    results.sort_by(compare);
    results.truncate(limit);
    results
}
