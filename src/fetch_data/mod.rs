use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::data::csv_types::{HistoryCsvRow, PutCsvRow};
use crate::data::{self, Manifest, ManifestEntry};
use crate::model::ScanConfig;
use crate::provider::polygon::PolygonProvider;

/// Run the fetch-data command: pull spot, history and puts for the universe, write CSVs + manifest.
pub fn run(config: &ScanConfig, output_dir: &Path) -> Result<()> {
    if config.universe.is_empty() {
        println!("Universe is empty. Nothing to fetch.");
        return Ok(());
    }

    let provider = PolygonProvider::from_env()?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    println!(
        "Fetch plan: {} tickers, {} days of history, puts {}-{} DTE",
        config.universe.len(),
        config.history_lookback_days,
        config.chain.min_dte,
        config.chain.max_dte,
    );
    println!();

    let as_of = chrono::Local::now().date_naive();
    let mut tickers = BTreeMap::new();
    let mut fail_count = 0u32;

    for (i, ticker) in config.universe.iter().enumerate() {
        println!("[{}/{}] Fetching {} ...", i + 1, config.universe.len(), ticker);

        match fetch_ticker(&provider, config, output_dir, ticker) {
            Ok((entry, bars, puts)) => {
                println!(
                    "  OK  {} spot {:.2} → {} ({} bars), {} ({} puts)",
                    ticker, entry.spot, entry.history, bars, entry.puts, puts
                );
                tickers.insert(ticker.clone(), entry);
            }
            Err(e) => {
                println!("  WARN  {} failed: {:#}. Skipping.", ticker, e);
                fail_count += 1;
            }
        }
    }

    let manifest = Manifest { as_of, tickers };
    if !manifest.tickers.is_empty() {
        data::write_manifest(output_dir, &manifest)?;
    }

    println!(
        "\nDone: {} succeeded, {} failed. Wrote manifest.json with {} entries to {}",
        manifest.tickers.len(),
        fail_count,
        manifest.tickers.len(),
        output_dir.display()
    );

    Ok(())
}

/// Fetch one ticker and write its two CSV files. Returns the manifest entry and row counts.
fn fetch_ticker(
    provider: &PolygonProvider,
    config: &ScanConfig,
    output_dir: &Path,
    ticker: &str,
) -> Result<(ManifestEntry, usize, usize)> {
    use crate::provider::MarketDataProvider;

    let spot = provider
        .spot_price(ticker)
        .with_context(|| format!("fetching spot for {ticker}"))?;
    let bars = provider
        .price_history(ticker, config.history_lookback_days)
        .with_context(|| format!("fetching history for {ticker}"))?;
    let puts = provider
        .put_chain(ticker, config.chain.min_dte, config.chain.max_dte)
        .with_context(|| format!("fetching puts for {ticker}"))?;

    let stem = data::sanitize(ticker);
    let history_file = format!("{stem}_history.csv");
    let puts_file = format!("{stem}_puts.csv");

    let history_rows: Vec<HistoryCsvRow> = bars.iter().map(HistoryCsvRow::from).collect();
    let put_rows: Vec<PutCsvRow> = puts
        .iter()
        .map(|q| PutCsvRow {
            strike: q.strike,
            expiration: q.expiration,
            bid: q.bid,
            ask: q.ask,
        })
        .collect();

    data::write_csv(output_dir, &history_file, &history_rows)?;
    data::write_csv(output_dir, &puts_file, &put_rows)?;

    Ok((
        ManifestEntry {
            spot,
            history: history_file,
            puts: puts_file,
        },
        history_rows.len(),
        put_rows.len(),
    ))
}
