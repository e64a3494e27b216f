//! Market data collaborators.
//!
//! The scan only reads through [`MarketDataProvider`]; every call returns an
//! explicit `Result` and the scan decides whether a failure skips the ticker.

pub mod cache;
#[cfg(feature = "full")]
pub mod offline;
#[cfg(feature = "full")]
pub mod polygon;

use thiserror::Error;

use crate::model::{PriceHistoryBar, PutQuote};

pub use cache::CachedProvider;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no data for `{ticker}`")]
    NotFound { ticker: String },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Read-only market data for one ticker at a time.
///
/// Implementations must be shareable across threads so a scan can fan out per ticker.
pub trait MarketDataProvider: Send + Sync {
    /// Latest traded price of the underlying.
    fn spot_price(&self, ticker: &str) -> ProviderResult<f64>;

    /// Daily closes covering roughly the last `lookback_days` calendar days, ascending.
    fn price_history(&self, ticker: &str, lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>>;

    /// Put quotes expiring between `min_dte` and `max_dte` days from today.
    fn put_chain(&self, ticker: &str, min_dte: i64, max_dte: i64) -> ProviderResult<Vec<PutQuote>>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for &P {
    fn spot_price(&self, ticker: &str) -> ProviderResult<f64> {
        (**self).spot_price(ticker)
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
        (**self).price_history(ticker, lookback_days)
    }

    fn put_chain(&self, ticker: &str, min_dte: i64, max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
        (**self).put_chain(ticker, min_dte, max_dte)
    }
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn spot_price(&self, ticker: &str) -> ProviderResult<f64> {
        (**self).spot_price(ticker)
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
        (**self).price_history(ticker, lookback_days)
    }

    fn put_chain(&self, ticker: &str, min_dte: i64, max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
        (**self).put_chain(ticker, min_dte, max_dte)
    }
}
