use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::candidate::CreditSpreadCandidate;

/// One ranked row: a ticker, its market context, and a spread that passed every filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub ticker: String,
    pub spot: f64,
    pub iv_rank: u8,
    pub spread: CreditSpreadCandidate,
    /// Ordering key only: reward:risk plus any preferred-set bonus.
    pub score: f64,
}

/// Final outcome of a scan over the whole universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "results", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Best candidates, highest score first (never more than the top-N limit).
    Ranked(Vec<ScanResult>),
    /// Every ticker was processed and nothing passed the filters.
    NoCandidates,
}

impl ScanOutcome {
    pub fn results(&self) -> &[ScanResult] {
        match self {
            ScanOutcome::Ranked(rows) => rows,
            ScanOutcome::NoCandidates => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ScanOutcome::NoCandidates)
    }
}

/// Why a ticker contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ProviderFailure,
    InsufficientHistory,
    LowIvRank,
    ThinChain,
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::ProviderFailure => "provider failure",
            SkipReason::InsufficientHistory => "insufficient history",
            SkipReason::LowIvRank => "IV rank below threshold",
            SkipReason::ThinChain => "fewer than 2 usable puts",
        }
    }
}

/// Counters describing what happened during a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    pub tickers_scanned: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Candidates produced by the enumerator before threshold gating.
    pub raw_candidates: usize,
    /// Candidates that passed the reward:risk and POP thresholds.
    pub passed_filters: usize,
}

impl ScanStats {
    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }

    pub fn tickers_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Outcome plus the counters collected while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub stats: ScanStats,
}
