use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tickers scanned when no universe is configured.
pub const DEFAULT_UNIVERSE: [&str; 25] = [
    "NVDA", "TSLA", "AAPL", "AMD", "AMZN", "MSFT", "META", "GOOGL", "AVGO", "SMCI", "PLTR", "ARM",
    "QCOM", "INTC", "MU", "COIN", "MARA", "RIVN", "SOFI", "AMC", "SPY", "QQQ", "TQQQ", "SSO", "IWM",
];

/// Broad-index ETFs that receive the ranking bonus when the bias is enabled.
pub const DEFAULT_PREFERRED_SET: [&str; 5] = ["SPY", "QQQ", "TQQQ", "SSO", "IWM"];

/// Immutable scan configuration: filter thresholds, universe, and model tuning.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScanConfig {
    /// Minimum credit / max-loss ratio a spread must reach (e.g. 0.5).
    pub min_reward_to_risk: f64,
    /// Minimum approximate probability of profit, in percent.
    pub min_probability_of_profit: u32,
    /// Minimum volatility rank (0-100) of the underlying.
    pub min_iv_rank: u32,
    /// Maximum strike width as a percentage of the spot price.
    pub max_width_pct: f64,
    /// Add `preferred_bonus` to the score of tickers in `preferred_set`.
    pub favor_preferred_set: bool,
    pub preferred_set: Vec<String>,
    /// Tickers to scan, in order.
    pub universe: Vec<String>,
    /// Score bonus for preferred tickers when the bias is enabled.
    pub preferred_bonus: f64,
    /// Calendar days of daily closes requested for the volatility rank.
    pub history_lookback_days: u32,
    pub spread: SpreadParams,
    pub chain: ChainFilter,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Preset::ShowAll.config()
    }
}

impl ScanConfig {
    /// Whether `ticker` is in the preferred set (case-insensitive).
    pub fn is_preferred(&self, ticker: &str) -> bool {
        self.preferred_set
            .iter()
            .any(|t| t.eq_ignore_ascii_case(ticker))
    }

    /// Start from a preset and overlay the keys present in a JSON config file.
    pub fn load(preset: Preset, path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(preset.config());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        let overlay: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config at {}", path.display()))?;

        let mut base = serde_json::to_value(preset.config()).context("serializing preset")?;
        merge_json(&mut base, overlay);
        serde_json::from_value(base).with_context(|| format!("decoding config at {}", path.display()))
    }

    /// Default config file location: `<config dir>/put-spread-scanner/config.json`.
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join("put-spread-scanner").join("config.json"))
    }
}

/// Recursively overlay `overlay` onto `base`; objects merge, everything else replaces.
fn merge_json(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Per-pair construction rules of the spread enumerator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SpreadParams {
    /// Short strikes at or above `spot * near_otm_factor` are skipped.
    pub near_otm_factor: f64,
    /// Minimum net credit per share.
    pub min_credit: f64,
    pub pop: PopModel,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            near_otm_factor: 0.99,
            min_credit: 0.05,
            pop: PopModel::default(),
        }
    }
}

/// Linear breakeven-cushion proxy for probability of profit:
/// `clamp(round(50 + distance_pct * scale_factor), lower_bound, upper_bound)`.
///
/// Not a statistical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PopModel {
    pub scale_factor: f64,
    pub lower_bound: u32,
    pub upper_bound: u32,
}

impl Default for PopModel {
    fn default() -> Self {
        Self {
            scale_factor: 150.0,
            lower_bound: 45,
            upper_bound: 85,
        }
    }
}

impl PopModel {
    /// `distance_pct` is `(spot - breakeven) / spot`, as a fraction.
    pub fn estimate(&self, distance_pct: f64) -> u32 {
        let raw = (50.0 + distance_pct * self.scale_factor).round();
        let (lo, hi) = (self.lower_bound as f64, self.upper_bound as f64);
        // NaN falls to the lower bound.
        if raw.is_nan() {
            return self.lower_bound;
        }
        raw.clamp(lo, hi) as u32
    }
}

/// Which quotes enter a put chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChainFilter {
    pub min_dte: i64,
    pub max_dte: i64,
    /// Minimum mid price; quieter strikes are treated as illiquid.
    pub min_mid: f64,
}

impl Default for ChainFilter {
    fn default() -> Self {
        Self {
            min_dte: 30,
            max_dte: 45,
            min_mid: 0.05,
        }
    }
}

// ── Presets ─────────────────────────────────────────────────────────

/// Named threshold bundles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Aggressive,
    Conservative,
    #[default]
    ShowAll,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Aggressive, Preset::Conservative, Preset::ShowAll];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Aggressive => "aggressive",
            Preset::Conservative => "conservative",
            Preset::ShowAll => "show-all",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Aggressive => "Aggressive edge: moderate R:R, elevated vol, wide strikes allowed",
            Preset::Conservative => "Conservative: higher R:R and POP, high vol only, narrow strikes",
            Preset::ShowAll => "Show all: loose thresholds so quiet markets still return rows",
        }
    }

    /// `(min_reward_to_risk, min_probability_of_profit, min_iv_rank, max_width_pct)`
    pub fn thresholds(&self) -> (f64, u32, u32, f64) {
        match self {
            Preset::Aggressive => (1.2, 55, 50, 15.0),
            Preset::Conservative => (1.4, 60, 65, 10.0),
            Preset::ShowAll => (0.5, 50, 20, 30.0),
        }
    }

    pub fn config(&self) -> ScanConfig {
        let (min_rr, min_pop, min_ivr, max_width) = self.thresholds();
        ScanConfig {
            min_reward_to_risk: min_rr,
            min_probability_of_profit: min_pop,
            min_iv_rank: min_ivr,
            max_width_pct: max_width,
            favor_preferred_set: true,
            preferred_set: DEFAULT_PREFERRED_SET.iter().map(|s| s.to_string()).collect(),
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            preferred_bonus: 4.0,
            history_lookback_days: 400,
            spread: SpreadParams::default(),
            chain: ChainFilter::default(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "aggressive" | "aggressive-edge" => Ok(Preset::Aggressive),
            "conservative" => Ok(Preset::Conservative),
            "show-all" | "all" => Ok(Preset::ShowAll),
            other => Err(format!(
                "unknown preset '{other}'. Use 'aggressive', 'conservative' or 'show-all'."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_model_clamps() {
        let pop = PopModel::default();
        assert_eq!(pop.estimate(0.0), 50);
        assert_eq!(pop.estimate(0.1), 65);
        assert_eq!(pop.estimate(1.0), 85);
        assert_eq!(pop.estimate(-1.0), 45);
        assert_eq!(pop.estimate(f64::NAN), 45);
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("Aggressive_Edge".parse::<Preset>().unwrap(), Preset::Aggressive);
        assert_eq!("show-all".parse::<Preset>().unwrap(), Preset::ShowAll);
        assert!("yolo".parse::<Preset>().is_err());
    }

    #[test]
    fn test_overlay_keeps_preset_baseline() {
        let path = std::env::temp_dir().join(format!("pss_config_{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"min_reward_to_risk": 0.8, "universe": ["SPY"], "spread": {"pop": {"scale_factor": 200.0}}}"#,
        )
        .unwrap();

        let config = ScanConfig::load(Preset::Conservative, Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.min_reward_to_risk, 0.8);
        assert_eq!(config.min_iv_rank, 65);
        assert_eq!(config.universe, vec!["SPY".to_string()]);
        assert_eq!(config.spread.pop.scale_factor, 200.0);
        assert_eq!(config.spread.pop.upper_bound, 85);
        assert_eq!(config.spread.near_otm_factor, 0.99);
    }
}
