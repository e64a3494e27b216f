use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{Days, NaiveDate};

use super::{MarketDataProvider, ProviderError, ProviderResult};
use crate::data::csv_types::{HistoryCsvRow, PutCsvRow};
use crate::data::{self, Manifest, ManifestEntry};
use crate::model::{PriceHistoryBar, PutQuote};

/// Serves market data from a directory written by `fetch-data`.
///
/// DTE and the history lookback are measured from the manifest's `as_of` date,
/// so a captured directory scans the same way on any later day.
pub struct CsvProvider {
    data_dir: PathBuf,
    manifest: Manifest,
}

impl CsvProvider {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let manifest = data::load_manifest(data_dir)?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            manifest,
        })
    }

    pub fn as_of(&self) -> NaiveDate {
        self.manifest.as_of
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.manifest.tickers.keys().map(String::as_str)
    }

    fn entry(&self, ticker: &str) -> ProviderResult<&ManifestEntry> {
        self.manifest
            .tickers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(ticker))
            .map(|(_, v)| v)
            .ok_or_else(|| ProviderError::NotFound {
                ticker: ticker.to_string(),
            })
    }

    fn load<T: for<'de> serde::Deserialize<'de>>(&self, filename: &str) -> ProviderResult<Vec<T>> {
        data::load_csv(&self.data_dir, filename).map_err(|e| ProviderError::Malformed(format!("{e:#}")))
    }
}

impl MarketDataProvider for CsvProvider {
    fn spot_price(&self, ticker: &str) -> ProviderResult<f64> {
        Ok(self.entry(ticker)?.spot)
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
        let entry = self.entry(ticker)?;
        let rows: Vec<HistoryCsvRow> = self.load(&entry.history)?;
        let start = self
            .as_of()
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .unwrap_or(NaiveDate::MIN);

        Ok(rows
            .into_iter()
            .filter(|r| r.date >= start && r.date <= self.as_of())
            .map(PriceHistoryBar::from)
            .collect())
    }

    fn put_chain(&self, ticker: &str, min_dte: i64, max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
        let entry = self.entry(ticker)?;
        let rows: Vec<PutCsvRow> = self.load(&entry.puts)?;
        let as_of = self.as_of();

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let dte = (r.expiration - as_of).num_days();
                (min_dte..=max_dte).contains(&dte).then_some(PutQuote {
                    strike: r.strike,
                    expiration: r.expiration,
                    days_to_expiration: dte,
                    bid: r.bid,
                    ask: r.ask,
                })
            })
            .collect())
    }
}
