//! Presentation of scan reports. Formatting lives here and nowhere in the scan.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{ScanOutcome, ScanReport, ScanResult};

/// Receives the final report of a scan.
pub trait PresentationSink {
    fn present(&mut self, report: &ScanReport) -> Result<()>;
}

/// Fan a report out to several sinks in order.
impl PresentationSink for Vec<Box<dyn PresentationSink>> {
    fn present(&mut self, report: &ScanReport) -> Result<()> {
        for sink in self.iter_mut() {
            sink.present(report)?;
        }
        Ok(())
    }
}

// ── Table ───────────────────────────────────────────────────────────

const RULE_WIDTH: usize = 104;
const BAR_WIDTH: usize = 40;

/// Fixed-width table plus a reward:risk bar chart.
pub struct TableSink<W: Write> {
    out: W,
    show_chart: bool,
}

impl TableSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TableSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_chart: true,
        }
    }

    pub fn without_chart(mut self) -> Self {
        self.show_chart = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_stats(&mut self, report: &ScanReport) -> Result<()> {
        let s = &report.stats;
        writeln!(
            self.out,
            "  Scanned {} tickers ({} skipped), found {} raw spreads, {} passed filters.",
            s.tickers_scanned,
            s.tickers_skipped(),
            s.raw_candidates,
            s.passed_filters,
        )?;
        if !s.skipped.is_empty() {
            let reasons: Vec<String> = s
                .skipped
                .iter()
                .map(|(reason, n)| format!("{}: {}", reason.label(), n))
                .collect();
            writeln!(self.out, "  Skipped: {}", reasons.join(", "))?;
        }
        Ok(())
    }

    fn write_table(&mut self, rows: &[ScanResult]) -> Result<()> {
        writeln!(self.out, "\n{}", "═".repeat(RULE_WIDTH))?;
        writeln!(self.out, "  Top {} Bull Put Credit Spreads", rows.len())?;
        writeln!(self.out, "{}", "═".repeat(RULE_WIDTH))?;
        writeln!(
            self.out,
            "  {:>2} {:<6} {:>9} {:<28} {:>4} {:>7} {:>7} {:>5} {:>5} {:>4} {:>7}",
            "#", "Ticker", "Price", "Strikes", "DTE", "Credit", "Risk", "R:R", "POP", "IVR", "Score",
        )?;
        writeln!(self.out, "  {}", "-".repeat(RULE_WIDTH - 4))?;
        for (i, r) in rows.iter().enumerate() {
            writeln!(
                self.out,
                "  {:>2} {:<6} {:>9.1} {:<28} {:>4} {:>7} {:>7} {:>5.2} {:>4}% {:>4} {:>7.2}",
                i + 1,
                r.ticker,
                r.spot,
                strikes_label(r),
                r.spread.days_to_expiration,
                format!("${:.2}", r.spread.credit),
                format!("${:.2}", r.spread.risk),
                r.spread.reward_to_risk,
                r.spread.probability_of_profit,
                r.iv_rank,
                r.score,
            )?;
        }
        writeln!(self.out, "{}", "═".repeat(RULE_WIDTH))?;
        Ok(())
    }

    fn write_chart(&mut self, rows: &[ScanResult]) -> Result<()> {
        let max = rows
            .iter()
            .map(|r| r.spread.reward_to_risk)
            .fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return Ok(());
        }
        writeln!(self.out, "\n  R:R ratio")?;
        for r in rows {
            let len = ((r.spread.reward_to_risk / max) * BAR_WIDTH as f64).round() as usize;
            writeln!(
                self.out,
                "  {:<6} │{:<width$} {:.2}",
                r.ticker,
                "█".repeat(len.max(1)),
                r.spread.reward_to_risk,
                width = BAR_WIDTH,
            )?;
        }
        Ok(())
    }
}

impl<W: Write> PresentationSink for TableSink<W> {
    fn present(&mut self, report: &ScanReport) -> Result<()> {
        match &report.outcome {
            ScanOutcome::NoCandidates => {
                writeln!(self.out)?;
                self.write_stats(report)?;
                writeln!(
                    self.out,
                    "  No spreads passed the filters. Try --preset show-all with --min-ivr 10 --min-rr 0.5."
                )?;
            }
            ScanOutcome::Ranked(rows) => {
                self.write_table(rows)?;
                self.write_stats(report)?;
                if self.show_chart {
                    self.write_chart(rows)?;
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

/// `Sell 95P / Buy 90P 01-16` (expiration as month-day).
pub fn strikes_label(r: &ScanResult) -> String {
    format!(
        "Sell {}P / Buy {}P {}",
        format_strike(r.spread.short_strike),
        format_strike(r.spread.long_strike),
        r.spread.expiration.format("%m-%d"),
    )
}

/// Whole strikes print without decimals, half strikes keep them.
fn format_strike(strike: f64) -> String {
    if strike.fract() == 0.0 {
        format!("{strike:.0}")
    } else {
        format!("{strike}")
    }
}

// ── JSON ────────────────────────────────────────────────────────────

/// Writes the full report as pretty JSON.
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl PresentationSink for JsonSink {
    fn present(&mut self, report: &ScanReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report).context("serializing scan report")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing report to {}", self.path.display()))?;
        println!("  Wrote report to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{CreditSpreadCandidate, ScanStats};

    fn row(ticker: &str, rr: f64) -> ScanResult {
        ScanResult {
            ticker: ticker.into(),
            spot: 100.0,
            iv_rank: 60,
            score: rr,
            spread: CreditSpreadCandidate {
                short_strike: 95.0,
                long_strike: 92.5,
                expiration: NaiveDate::from_ymd_opt(2026, 1, 16).unwrap(),
                days_to_expiration: 41,
                short_bid: 1.5,
                long_ask: 0.4,
                credit: 1.1,
                width: 2.5,
                risk: 1.4,
                reward_to_risk: rr,
                breakeven: 93.9,
                probability_of_profit: 59,
            },
        }
    }

    #[test]
    fn test_table_lists_rows() {
        let report = ScanReport {
            outcome: ScanOutcome::Ranked(vec![row("SPY", 0.79), row("AMD", 0.5)]),
            stats: ScanStats::default(),
        };
        let mut sink = TableSink::new(Vec::new());
        sink.present(&report).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();

        assert!(text.contains("Top 2 Bull Put Credit Spreads"));
        assert!(text.contains("Sell 95P / Buy 92.5P 01-16"));
        assert!(text.contains("R:R ratio"));
    }

    #[test]
    fn test_table_no_candidates() {
        let report = ScanReport {
            outcome: ScanOutcome::NoCandidates,
            stats: ScanStats::default(),
        };
        let mut sink = TableSink::new(Vec::new()).without_chart();
        sink.present(&report).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("No spreads passed the filters"));
    }
}
