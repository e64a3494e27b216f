//! Bull put credit spread scanner.
//!
//! For every ticker in a universe the scan fetches the spot price and daily
//! closes, ranks today's realized volatility against its own history, gates on
//! that rank, then walks adjacent strikes of the put chain building credit
//! spreads. Spreads that clear the reward:risk and probability-of-profit
//! thresholds are scored and the best five are returned.
//!
//! ```rust,no_run
//! use put_spread_scanner::model::Preset;
//! use put_spread_scanner::provider::polygon::PolygonProvider;
//! use put_spread_scanner::scan;
//!
//! let config = Preset::Aggressive.config();
//! let provider = PolygonProvider::from_env().unwrap();
//! let report = scan::scan(&config, &provider).unwrap();
//! for row in report.outcome.results() {
//!     println!("{} {:.0}/{:.0} R:R {}", row.ticker, row.spread.short_strike, row.spread.long_strike, row.spread.reward_to_risk);
//! }
//! ```

pub mod model;
pub mod provider;
pub mod report;
pub mod scan;
pub mod spread;
pub mod validate;
pub mod volatility;

#[cfg(feature = "full")]
pub mod data;
#[cfg(feature = "full")]
pub mod fetch_data;

pub use model::{ScanConfig, ScanOutcome, ScanReport, ScanResult};
pub use scan::{ScanError, scan};
