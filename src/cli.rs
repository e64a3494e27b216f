use clap::{Parser, Subcommand};
use std::path::PathBuf;

use put_spread_scanner::model::Preset;

/// Bull put credit spread scanner. Ranks credit spreads across a ticker
/// universe by reward:risk, gated on realized-volatility rank.
#[derive(Parser)]
#[command(name = "put-spread-scanner", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan the universe and print the top five spreads
    Scan {
        /// Path to a config JSON file (default: the user config dir, if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Threshold preset: aggressive, conservative, or show-all
        #[arg(long, default_value = "show-all")]
        preset: Preset,

        /// Override the minimum reward:risk ratio
        #[arg(long)]
        min_rr: Option<f64>,

        /// Override the minimum probability of profit (percent)
        #[arg(long)]
        min_pop: Option<u32>,

        /// Override the minimum IV rank (0-100)
        #[arg(long)]
        min_ivr: Option<u32>,

        /// Override the maximum spread width as a percent of spot
        #[arg(long)]
        max_width: Option<f64>,

        /// Score every ticker equally (no preferred-set bonus)
        #[arg(long)]
        no_etf_bias: bool,

        /// Scan offline from a directory written by `fetch-data`
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Fetch tickers concurrently
        #[arg(long)]
        parallel: bool,

        /// Also write the report as JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Re-scan every N seconds until interrupted
        #[arg(long)]
        watch: Option<u64>,

        /// Print debug logs to stderr
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Fetch market data for the universe into a directory for offline scans
    FetchData {
        /// Path to a config JSON file (supplies the universe and lookback)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Threshold preset the config file overlays
        #[arg(long, default_value = "show-all")]
        preset: Preset,

        /// Output directory for CSV files and manifest.json
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
    },

    /// List the threshold presets
    Presets,

    /// Output an example config JSON to stdout
    Example,

    /// Output the JSON schema for config files
    Schema,

    /// Validate a config JSON file
    Validate {
        /// Path to the config JSON file
        file: PathBuf,

        /// Preset the file overlays
        #[arg(long, default_value = "show-all")]
        preset: Preset,
    },
}
