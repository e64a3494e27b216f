use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::model::{Preset, ScanConfig};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Universe is empty; nothing to scan")]
    EmptyUniverse,

    #[error("Universe contains a blank ticker at position {index}")]
    BlankTicker { index: usize },

    #[error("Ticker `{ticker}` appears more than once in the universe")]
    DuplicateTicker { ticker: String },

    #[error("`{field}` must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("`{field}` must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("`{field}` is a percentage and must be within 0..=100, got {value}")]
    PercentOutOfRange { field: &'static str, value: u32 },

    #[error("POP bounds inverted: lower_bound {lower} > upper_bound {upper}")]
    PopBoundsInverted { lower: u32, upper: u32 },

    #[error("DTE window inverted: min_dte {min} > max_dte {max}")]
    DteWindowInverted { min: i64, max: i64 },

    #[error("`chain.min_dte` must not be negative, got {value}")]
    NegativeDte { value: i64 },

    #[error("`spread.near_otm_factor` must be within (0, 1.5], got {value}")]
    NearOtmFactorOutOfRange { value: f64 },

    #[error("`history_lookback_days` of {value} cannot cover the 21 trading days the volatility rank needs")]
    LookbackTooShort { value: u32 },
}

/// Shortest calendar lookback that can hold 21 trading days.
const MIN_LOOKBACK_DAYS: u32 = 30;

/// Validate a scan config, collecting every error.
pub fn validate(config: &ScanConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    errors.extend(check_universe(&config.universe));
    errors.extend(check_thresholds(config));
    errors.extend(check_tuning(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_universe(universe: &[String]) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    if universe.is_empty() {
        errors.push(ConfigError::EmptyUniverse);
        return errors;
    }

    let mut seen = HashSet::new();
    for (index, ticker) in universe.iter().enumerate() {
        let normalized = ticker.trim().to_uppercase();
        if normalized.is_empty() {
            errors.push(ConfigError::BlankTicker { index });
        } else if !seen.insert(normalized) {
            errors.push(ConfigError::DuplicateTicker {
                ticker: ticker.clone(),
            });
        }
    }
    errors
}

fn check_thresholds(config: &ScanConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    finite_non_negative(&mut errors, "min_reward_to_risk", config.min_reward_to_risk);
    finite_positive(&mut errors, "max_width_pct", config.max_width_pct);
    finite_non_negative(&mut errors, "preferred_bonus", config.preferred_bonus);

    for (field, value) in [
        ("min_probability_of_profit", config.min_probability_of_profit),
        ("min_iv_rank", config.min_iv_rank),
    ] {
        if value > 100 {
            errors.push(ConfigError::PercentOutOfRange { field, value });
        }
    }

    if config.history_lookback_days < MIN_LOOKBACK_DAYS {
        errors.push(ConfigError::LookbackTooShort {
            value: config.history_lookback_days,
        });
    }

    errors
}

fn check_tuning(config: &ScanConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let spread = &config.spread;
    let pop = &spread.pop;
    let chain = &config.chain;

    let factor = spread.near_otm_factor;
    if !factor.is_finite() || factor <= 0.0 || factor > 1.5 {
        errors.push(ConfigError::NearOtmFactorOutOfRange { value: factor });
    }
    finite_non_negative(&mut errors, "spread.min_credit", spread.min_credit);
    finite_positive(&mut errors, "spread.pop.scale_factor", pop.scale_factor);

    for (field, value) in [
        ("spread.pop.lower_bound", pop.lower_bound),
        ("spread.pop.upper_bound", pop.upper_bound),
    ] {
        if value > 100 {
            errors.push(ConfigError::PercentOutOfRange { field, value });
        }
    }
    if pop.lower_bound > pop.upper_bound {
        errors.push(ConfigError::PopBoundsInverted {
            lower: pop.lower_bound,
            upper: pop.upper_bound,
        });
    }

    if chain.min_dte < 0 {
        errors.push(ConfigError::NegativeDte {
            value: chain.min_dte,
        });
    }
    if chain.min_dte > chain.max_dte {
        errors.push(ConfigError::DteWindowInverted {
            min: chain.min_dte,
            max: chain.max_dte,
        });
    }
    finite_non_negative(&mut errors, "chain.min_mid", chain.min_mid);

    errors
}

fn finite_positive(errors: &mut Vec<ConfigError>, field: &'static str, value: f64) {
    if !value.is_finite() {
        errors.push(ConfigError::NotFinite { field, value });
    } else if value <= 0.0 {
        errors.push(ConfigError::NotPositive { field, value });
    }
}

fn finite_non_negative(errors: &mut Vec<ConfigError>, field: &'static str, value: f64) {
    if !value.is_finite() {
        errors.push(ConfigError::NotFinite { field, value });
    } else if value < 0.0 {
        errors.push(ConfigError::Negative { field, value });
    }
}

/// CLI entry point for the `validate` subcommand.
pub fn run(path: &Path, preset: Preset) -> anyhow::Result<()> {
    let config = ScanConfig::load(preset, Some(path))?;
    match validate(&config) {
        Ok(()) => {
            println!(
                "Config '{}' is valid. {} tickers, {} preferred, thresholds R:R >= {}, POP >= {}%, IVR >= {}, width <= {}%.",
                path.display(),
                config.universe.len(),
                config.preferred_set.len(),
                config.min_reward_to_risk,
                config.min_probability_of_profit,
                config.min_iv_rank,
                config.max_width_pct,
            );
            Ok(())
        }
        Err(errors) => {
            eprintln!("Validation failed with {} error(s):", errors.len());
            for (i, e) in errors.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, e);
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for preset in Preset::ALL {
            assert_eq!(validate(&preset.config()), Ok(()), "preset {preset}");
        }
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ScanConfig::default();
        config.universe = vec!["SPY".into(), " ".into(), "spy".into()];
        config.max_width_pct = 0.0;
        config.min_iv_rank = 120;
        config.spread.pop.lower_bound = 90;
        config.chain.min_dte = 50;

        let errors = validate(&config).unwrap_err();
        assert!(errors.contains(&ConfigError::BlankTicker { index: 1 }));
        assert!(errors.contains(&ConfigError::DuplicateTicker {
            ticker: "spy".into()
        }));
        assert!(errors.contains(&ConfigError::NotPositive {
            field: "max_width_pct",
            value: 0.0
        }));
        assert!(errors.contains(&ConfigError::PercentOutOfRange {
            field: "min_iv_rank",
            value: 120
        }));
        assert!(errors.contains(&ConfigError::PopBoundsInverted { lower: 90, upper: 85 }));
        assert!(errors.contains(&ConfigError::DteWindowInverted { min: 50, max: 45 }));
    }

    #[test]
    fn test_empty_universe() {
        let mut config = ScanConfig::default();
        config.universe.clear();
        assert_eq!(validate(&config), Err(vec![ConfigError::EmptyUniverse]));
    }
}
