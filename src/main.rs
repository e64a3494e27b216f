use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use put_spread_scanner::fetch_data;
use put_spread_scanner::model::{Preset, ScanConfig};
use put_spread_scanner::provider::offline::CsvProvider;
use put_spread_scanner::provider::polygon::PolygonProvider;
use put_spread_scanner::provider::{CachedProvider, MarketDataProvider};
use put_spread_scanner::report::{JsonSink, PresentationSink, TableSink};
use put_spread_scanner::scan::{self, ScanObserver, ScanOptions, TickerOutcome};
use put_spread_scanner::validate;

mod cli;
mod example;
mod presets;
mod schema;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let verbose = matches!(cli.command, cli::Command::Scan { verbose: true, .. });
    init_logging(verbose);

    match cli.command {
        cli::Command::Scan {
            config,
            preset,
            min_rr,
            min_pop,
            min_ivr,
            max_width,
            no_etf_bias,
            data_dir,
            parallel,
            output,
            watch,
            verbose: _,
        } => {
            let mut scan_config = load_config(preset, config.as_deref())?;
            if let Some(v) = min_rr {
                scan_config.min_reward_to_risk = v;
            }
            if let Some(v) = min_pop {
                scan_config.min_probability_of_profit = v;
            }
            if let Some(v) = min_ivr {
                scan_config.min_iv_rank = v;
            }
            if let Some(v) = max_width {
                scan_config.max_width_pct = v;
            }
            if no_etf_bias {
                scan_config.favor_preferred_set = false;
            }
            run_scan(&ScanRun {
                config: scan_config,
                data_dir,
                parallel,
                output,
                watch: watch.map(Duration::from_secs),
            })
        }
        cli::Command::FetchData {
            config,
            preset,
            output_dir,
        } => {
            let scan_config = load_config(preset, config.as_deref())?;
            fetch_data::run(&scan_config, &output_dir)
        }
        cli::Command::Presets => presets::run(),
        cli::Command::Example => example::run(),
        cli::Command::Schema => schema::run(),
        cli::Command::Validate { file, preset } => validate::run(&file, preset),
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "put_spread_scanner=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit `--config`, else the user config file if one exists, else the bare preset.
fn load_config(preset: Preset, path: Option<&Path>) -> Result<ScanConfig> {
    let default_path = ScanConfig::default_path().filter(|p| p.exists());
    ScanConfig::load(preset, path.or(default_path.as_deref()))
}

struct ScanRun {
    config: ScanConfig,
    data_dir: Option<PathBuf>,
    parallel: bool,
    output: Option<PathBuf>,
    watch: Option<Duration>,
}

fn run_scan(run: &ScanRun) -> Result<()> {
    let source: Box<dyn MarketDataProvider> = match &run.data_dir {
        Some(dir) => {
            let provider = CsvProvider::open(dir)
                .with_context(|| format!("opening offline data in {}", dir.display()))?;
            println!(
                "Scanning offline data from {} (as of {})",
                dir.display(),
                provider.as_of()
            );
            Box::new(provider)
        }
        None => Box::new(PolygonProvider::from_env()?),
    };
    let provider = CachedProvider::new(source);

    let mut sinks: Vec<Box<dyn PresentationSink>> = vec![Box::new(TableSink::stdout())];
    if let Some(path) = &run.output {
        sinks.push(Box::new(JsonSink::new(path)));
    }

    let options = ScanOptions {
        parallel: run.parallel,
    };

    loop {
        let progress = ScanProgress::new(run.config.universe.len())?;
        let report = scan::scan_with(&run.config, &provider, &options, &progress)?;
        progress.finish();
        sinks.present(&report)?;

        match run.watch {
            Some(interval) => {
                println!("\n  Next scan in {}s (Ctrl-C to stop)", interval.as_secs());
                std::thread::sleep(interval);
            }
            None => return Ok(()),
        }
    }
}

/// Progress bar advanced once per finished ticker.
struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    fn new(tickers: usize) -> Result<Self> {
        let bar = ProgressBar::new(tickers as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  Scanning [{bar:40}] {pos}/{len} {msg}")?,
        );
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ScanObserver for ScanProgress {
    fn ticker_done(&self, ticker: &str, outcome: &TickerOutcome) {
        let msg = match outcome {
            TickerOutcome::Skipped(reason) => format!("{ticker}: {}", reason.label()),
            TickerOutcome::Evaluated { raw, kept } => format!("{ticker}: {kept}/{raw} spreads"),
        };
        self.bar.set_message(msg);
        self.bar.inc(1);
    }
}
