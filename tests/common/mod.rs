#![allow(dead_code)]

use std::collections::HashMap;

use chrono::{Days, NaiveDate};

use put_spread_scanner::model::{PriceHistoryBar, PutQuote};
use put_spread_scanner::provider::{MarketDataProvider, ProviderError, ProviderResult};

pub const DTE: i64 = 35;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 5).unwrap()
}

pub fn expiration() -> NaiveDate {
    today() + Days::new(DTE as u64)
}

pub fn put(strike: f64, bid: f64, ask: f64) -> PutQuote {
    PutQuote {
        strike,
        expiration: expiration(),
        days_to_expiration: DTE,
        bid,
        ask,
    }
}

/// Daily bars ending today, one per calendar day.
pub fn bars(closes: &[f64]) -> Vec<PriceHistoryBar> {
    let n = closes.len() as u64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceHistoryBar::new(today() - Days::new(n - 1 - i as u64), close))
        .collect()
}

pub fn flat_closes(n: usize) -> Vec<f64> {
    vec![100.0; n]
}

/// Closes whose daily moves alternate up and down by `first` for `n_first`
/// returns, then by `second` for `n_second` returns.
pub fn regime_closes(first: f64, n_first: usize, second: f64, n_second: usize) -> Vec<f64> {
    let mut closes = vec![100.0];
    let moves = std::iter::repeat_n(first, n_first).chain(std::iter::repeat_n(second, n_second));
    for (i, m) in moves.enumerate() {
        let last = *closes.last().unwrap();
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        closes.push(last * (1.0 + sign * m));
    }
    closes
}

/// 95/90 pair at spot 100 worth credit 1.60, R:R 0.47, POP 60.
pub fn scenario_b_chain() -> Vec<PutQuote> {
    vec![put(95.0, 2.00, 2.10), put(90.0, 0.30, 0.40)]
}

/// 95/90 pair at spot 100 worth credit 0.40, R:R 0.09.
pub fn scenario_a_chain() -> Vec<PutQuote> {
    vec![put(95.0, 1.00, 1.10), put(90.0, 0.50, 0.60)]
}

// ── Mock provider ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockTicker {
    pub spot: ProviderResult<f64>,
    pub history: ProviderResult<Vec<PriceHistoryBar>>,
    pub chain: ProviderResult<Vec<PutQuote>>,
}

impl MockTicker {
    pub fn new(spot: f64, closes: &[f64], chain: Vec<PutQuote>) -> Self {
        Self {
            spot: Ok(spot),
            history: Ok(bars(closes)),
            chain: Ok(chain),
        }
    }

    pub fn failing() -> Self {
        let err = ProviderError::Network("connection reset".into());
        Self {
            spot: Err(err.clone()),
            history: Err(err.clone()),
            chain: Err(err),
        }
    }
}

/// In-memory provider. Unknown tickers answer `NotFound`.
#[derive(Default)]
pub struct MockProvider {
    tickers: HashMap<String, MockTicker>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ticker: &str, data: MockTicker) -> Self {
        self.tickers.insert(ticker.to_string(), data);
        self
    }

    fn get(&self, ticker: &str) -> ProviderResult<&MockTicker> {
        self.tickers.get(ticker).ok_or_else(|| ProviderError::NotFound {
            ticker: ticker.to_string(),
        })
    }
}

impl MarketDataProvider for MockProvider {
    fn spot_price(&self, ticker: &str) -> ProviderResult<f64> {
        self.get(ticker)?.spot.clone()
    }

    fn price_history(&self, ticker: &str, _lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
        self.get(ticker)?.history.clone()
    }

    fn put_chain(&self, ticker: &str, _min_dte: i64, _max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
        self.get(ticker)?.chain.clone()
    }
}
