//! Adjacent-strike bull put credit spread construction.

use std::fmt;

use crate::model::{CreditSpreadCandidate, PutChain, PutQuote, SpreadParams};

/// Why an adjacent pair did not become a candidate, in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Legs expire on different dates.
    ExpirationMismatch,
    /// Same strike on both legs.
    NonPositiveWidth,
    /// Short strike at or above `spot * near_otm_factor`.
    NearTheMoney,
    /// Net credit below the configured floor.
    CreditBelowFloor,
    /// Width exceeds `max_width_pct` of spot.
    TooWide,
    /// Credit at or above width: a pricing anomaly.
    NonPositiveRisk,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::ExpirationMismatch => "legs expire on different dates",
            Rejection::NonPositiveWidth => "legs share a strike",
            Rejection::NearTheMoney => "short strike too close to spot",
            Rejection::CreditBelowFloor => "credit below floor",
            Rejection::TooWide => "width exceeds max % of spot",
            Rejection::NonPositiveRisk => "credit at or above width",
        };
        f.write_str(s)
    }
}

/// Lazy single pass over adjacent strike pairs of a chain.
///
/// Pair `j` uses `quotes[j]` as the long leg and `quotes[j + 1]` as the short leg,
/// so the chain must be sorted ascending by strike. Only threshold-free
/// construction rules apply here; reward:risk and POP gating belong to the scan.
pub struct SpreadEnumerator<'a> {
    quotes: &'a [PutQuote],
    spot: f64,
    max_width_pct: f64,
    params: &'a SpreadParams,
    next: usize,
}

impl<'a> SpreadEnumerator<'a> {
    pub fn new(chain: &'a PutChain, spot: f64, max_width_pct: f64, params: &'a SpreadParams) -> Self {
        // A non-positive spot cannot price anything; start exhausted.
        let quotes: &'a [PutQuote] = if spot.is_finite() && spot > 0.0 {
            chain.quotes()
        } else {
            &[]
        };
        Self {
            quotes,
            spot,
            max_width_pct,
            params,
            next: 0,
        }
    }
}

impl Iterator for SpreadEnumerator<'_> {
    type Item = CreditSpreadCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next + 1 < self.quotes.len() {
            let long = &self.quotes[self.next];
            let short = &self.quotes[self.next + 1];
            self.next += 1;

            if let Ok(candidate) = build_candidate(short, long, self.spot, self.max_width_pct, self.params) {
                return Some(candidate);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.quotes.len().saturating_sub(self.next + 1)))
    }
}

/// Enumerate every candidate of `chain` for an underlying trading at `spot`.
pub fn enumerate<'a>(
    chain: &'a PutChain,
    spot: f64,
    max_width_pct: f64,
    params: &'a SpreadParams,
) -> SpreadEnumerator<'a> {
    SpreadEnumerator::new(chain, spot, max_width_pct, params)
}

/// Apply the construction rules to one pair, stopping at the first that fails.
pub fn build_candidate(
    short: &PutQuote,
    long: &PutQuote,
    spot: f64,
    max_width_pct: f64,
    params: &SpreadParams,
) -> Result<CreditSpreadCandidate, Rejection> {
    if short.expiration != long.expiration {
        return Err(Rejection::ExpirationMismatch);
    }
    if short.strike <= long.strike {
        return Err(Rejection::NonPositiveWidth);
    }

    if short.strike >= spot * params.near_otm_factor {
        return Err(Rejection::NearTheMoney);
    }

    let credit = round_to(short.bid - long.ask, 3);
    if credit <= 0.0 || credit < params.min_credit {
        return Err(Rejection::CreditBelowFloor);
    }

    let width = short.strike - long.strike;
    if width / spot * 100.0 > max_width_pct {
        return Err(Rejection::TooWide);
    }

    let risk = width - credit;
    if risk <= 0.0 {
        return Err(Rejection::NonPositiveRisk);
    }

    let reward_to_risk = round_to(credit / risk, 2);

    let breakeven = short.strike - credit;
    let distance_pct = (spot - breakeven) / spot;
    let probability_of_profit = params.pop.estimate(distance_pct);

    Ok(CreditSpreadCandidate {
        short_strike: short.strike,
        long_strike: long.strike,
        expiration: short.expiration,
        days_to_expiration: short.days_to_expiration,
        short_bid: short.bid,
        long_ask: long.ask,
        credit,
        width,
        risk,
        reward_to_risk,
        breakeven,
        probability_of_profit,
    })
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
