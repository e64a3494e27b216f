//! Universe scan: per-ticker gating, candidate filtering, and top-N ranking.

pub mod ranking;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{
    PriceHistory, PutChain, ScanConfig, ScanOutcome, ScanReport, ScanResult, ScanStats, SkipReason,
};
use crate::provider::MarketDataProvider;
use crate::spread;
use crate::validate::{self, ConfigError};
use crate::volatility::{self, VolatilityError};

/// Maximum number of rows a scan returns.
pub const TOP_N: usize = 5;

/// The scan could not run at all. Raised before any ticker is fetched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    #[error("scan cannot run: the universe is empty")]
    EmptyUniverse,

    #[error("scan cannot run: invalid configuration:\n  {}", format_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
}

fn format_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n  ")
}

/// Execution knobs that do not change the result.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Fan tickers out over a thread pool. Output is identical to the sequential scan.
    pub parallel: bool,
}

/// What one ticker contributed.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Skipped(SkipReason),
    Evaluated { raw: usize, kept: usize },
}

/// Receives per-ticker progress. Called from worker threads in parallel mode.
pub trait ScanObserver: Sync {
    fn ticker_done(&self, _ticker: &str, _outcome: &TickerOutcome) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Everything one ticker produced.
#[derive(Debug, Clone)]
pub struct TickerScan {
    pub ticker: String,
    pub outcome: TickerOutcome,
    pub results: Vec<ScanResult>,
}

impl TickerScan {
    fn skipped(ticker: &str, reason: SkipReason) -> Self {
        Self {
            ticker: ticker.to_string(),
            outcome: TickerOutcome::Skipped(reason),
            results: Vec::new(),
        }
    }
}

// ── Aggregator ──────────────────────────────────────────────────────

/// Accumulates per-ticker results; ranking happens once, in [`ScanAggregator::finish`].
#[derive(Debug, Default)]
pub struct ScanAggregator {
    results: Vec<ScanResult>,
    stats: ScanStats,
}

impl ScanAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scan: TickerScan) {
        self.stats.tickers_scanned += 1;
        match scan.outcome {
            TickerOutcome::Skipped(reason) => self.stats.record_skip(reason),
            TickerOutcome::Evaluated { raw, kept } => {
                self.stats.raw_candidates += raw;
                self.stats.passed_filters += kept;
            }
        }
        self.results.extend(scan.results);
    }

    /// Sort, truncate to [`TOP_N`], and distinguish "nothing matched".
    pub fn finish(self) -> ScanReport {
        let outcome = if self.results.is_empty() {
            ScanOutcome::NoCandidates
        } else {
            ScanOutcome::Ranked(ranking::top(self.results, TOP_N))
        };
        ScanReport {
            outcome,
            stats: self.stats,
        }
    }
}

// ── Entry points ────────────────────────────────────────────────────

/// Scan the configured universe sequentially.
pub fn scan<P: MarketDataProvider + ?Sized>(
    config: &ScanConfig,
    provider: &P,
) -> Result<ScanReport, ScanError> {
    scan_with(config, provider, &ScanOptions::default(), &NoopObserver)
}

/// Scan the configured universe, reporting per-ticker progress to `observer`.
pub fn scan_with<P: MarketDataProvider + ?Sized>(
    config: &ScanConfig,
    provider: &P,
    options: &ScanOptions,
    observer: &dyn ScanObserver,
) -> Result<ScanReport, ScanError> {
    check_config(config)?;

    let tickers = scan_tickers(config, provider, options, observer);

    let mut aggregator = ScanAggregator::new();
    for ticker in tickers {
        aggregator.push(ticker);
    }
    let report = aggregator.finish();

    info!(
        scanned = report.stats.tickers_scanned,
        skipped = report.stats.tickers_skipped(),
        raw = report.stats.raw_candidates,
        passed = report.stats.passed_filters,
        "scan complete"
    );
    Ok(report)
}

fn check_config(config: &ScanConfig) -> Result<(), ScanError> {
    if config.universe.is_empty() {
        return Err(ScanError::EmptyUniverse);
    }
    validate::validate(config).map_err(ScanError::InvalidConfig)
}

#[cfg(feature = "full")]
fn scan_tickers<P: MarketDataProvider + ?Sized>(
    config: &ScanConfig,
    provider: &P,
    options: &ScanOptions,
    observer: &dyn ScanObserver,
) -> Vec<TickerScan> {
    use rayon::prelude::*;

    let run = |ticker: &String| {
        let scan = scan_ticker(ticker, config, provider);
        observer.ticker_done(ticker, &scan.outcome);
        scan
    };

    if options.parallel {
        config.universe.par_iter().map(run).collect()
    } else {
        config.universe.iter().map(run).collect()
    }
}

#[cfg(not(feature = "full"))]
fn scan_tickers<P: MarketDataProvider + ?Sized>(
    config: &ScanConfig,
    provider: &P,
    options: &ScanOptions,
    observer: &dyn ScanObserver,
) -> Vec<TickerScan> {
    if options.parallel {
        debug!("parallel scan requested without the `full` feature; scanning sequentially");
    }
    config
        .universe
        .iter()
        .map(|ticker| {
            let scan = scan_ticker(ticker, config, provider);
            observer.ticker_done(ticker, &scan.outcome);
            scan
        })
        .collect()
}

/// Fetch, gate, enumerate and filter a single ticker. Never fails: problems skip the ticker.
pub fn scan_ticker<P: MarketDataProvider + ?Sized>(
    ticker: &str,
    config: &ScanConfig,
    provider: &P,
) -> TickerScan {
    let spot = match provider.spot_price(ticker) {
        Ok(spot) if spot.is_finite() && spot > 0.0 => spot,
        Ok(spot) => {
            warn!(ticker, spot, "provider returned an unusable spot price");
            return TickerScan::skipped(ticker, SkipReason::ProviderFailure);
        }
        Err(e) => {
            warn!(ticker, error = %e, "spot price unavailable");
            return TickerScan::skipped(ticker, SkipReason::ProviderFailure);
        }
    };

    let bars = match provider.price_history(ticker, config.history_lookback_days) {
        Ok(bars) => bars,
        Err(e) => {
            warn!(ticker, error = %e, "price history unavailable");
            return TickerScan::skipped(ticker, SkipReason::ProviderFailure);
        }
    };

    let iv_rank = match volatility::estimate(&PriceHistory::new(bars)) {
        Ok(rank) => rank,
        Err(e @ VolatilityError::InsufficientData { .. }) => {
            debug!(ticker, error = %e, "skipping");
            return TickerScan::skipped(ticker, SkipReason::InsufficientHistory);
        }
        Err(e @ VolatilityError::InvalidClose { .. }) => {
            warn!(ticker, error = %e, "malformed price history");
            return TickerScan::skipped(ticker, SkipReason::ProviderFailure);
        }
    };

    if u32::from(iv_rank.value()) < config.min_iv_rank {
        debug!(ticker, iv_rank = iv_rank.value(), min = config.min_iv_rank, "IV rank below threshold");
        return TickerScan::skipped(ticker, SkipReason::LowIvRank);
    }

    let quotes = match provider.put_chain(ticker, config.chain.min_dte, config.chain.max_dte) {
        Ok(quotes) => quotes,
        Err(e) => {
            warn!(ticker, error = %e, "put chain unavailable");
            return TickerScan::skipped(ticker, SkipReason::ProviderFailure);
        }
    };

    let chain = PutChain::from_quotes(quotes, &config.chain);
    if chain.len() < 2 {
        debug!(ticker, usable = chain.len(), "chain too thin");
        return TickerScan::skipped(ticker, SkipReason::ThinChain);
    }

    let mut raw = 0;
    let mut results = Vec::new();
    for expiry_chain in chain.by_expiration() {
        for candidate in spread::enumerate(&expiry_chain, spot, config.max_width_pct, &config.spread) {
            raw += 1;
            if candidate.reward_to_risk < config.min_reward_to_risk
                || candidate.probability_of_profit < config.min_probability_of_profit
            {
                continue;
            }
            results.push(ScanResult {
                ticker: ticker.to_string(),
                spot,
                iv_rank: iv_rank.value(),
                score: ranking::score(config, ticker, candidate.reward_to_risk),
                spread: candidate,
            });
        }
    }

    debug!(ticker, spot, iv_rank = iv_rank.value(), raw, kept = results.len(), "ticker evaluated");
    TickerScan {
        ticker: ticker.to_string(),
        outcome: TickerOutcome::Evaluated {
            raw,
            kept: results.len(),
        },
        results,
    }
}
