//! Search and backtest configuration built from a [`ConfigPort`].
//!
//! INI layout:
//!
//! ```ini
//! [search]
//! beam_width = 10
//! top_k = 10
//! iterations = 5
//! step_fraction = 0.1
//! risk_free_rate = 0.0
//!
//! [backtest]
//! risk_free_rate = 0.0
//!
//! [params]            ; threshold overrides, free-form keys
//! rsi_oversold = 28
//!
//! [ranges]            ; per-parameter bounds as "low,high"
//! rsi_oversold = 20,40
//! ```

use crate::domain::error::RuletraderError;
use crate::domain::facts::{Params, default_params};
use crate::domain::search::{ParamRange, ParamRanges, SearchConfig, default_param_ranges};
use crate::ports::config_port::ConfigPort;

/// Backtest-only settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestConfig {
    pub risk_free_rate: f64,
}

/// Build and validate a [`SearchConfig`] from `[search]`.
pub fn build_search_config(config: &dyn ConfigPort) -> Result<SearchConfig, RuletraderError> {
    let defaults = SearchConfig::default();

    let beam_width = config.get_int("search", "beam_width", defaults.beam_width as i64);
    let top_k = config.get_int("search", "top_k", defaults.top_k as i64);
    let iterations = config.get_int("search", "iterations", defaults.iterations as i64);
    let step_fraction = config.get_double("search", "step_fraction", defaults.step_fraction);
    let risk_free_rate = config.get_double("search", "risk_free_rate", defaults.risk_free_rate);

    for (key, value) in [
        ("beam_width", beam_width),
        ("top_k", top_k),
        ("iterations", iterations),
    ] {
        if value < 1 {
            return Err(RuletraderError::ConfigInvalid {
                section: "search".into(),
                key: key.into(),
                reason: format!("must be at least 1, got {value}"),
            });
        }
    }

    if !(step_fraction > 0.0 && step_fraction < 1.0) {
        return Err(RuletraderError::ConfigInvalid {
            section: "search".into(),
            key: "step_fraction".into(),
            reason: format!("must be in (0, 1), got {step_fraction}"),
        });
    }

    Ok(SearchConfig {
        beam_width: beam_width as usize,
        top_k: top_k as usize,
        iterations: iterations as usize,
        step_fraction,
        risk_free_rate,
    })
}

/// Build a [`BacktestConfig`] from `[backtest]`.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, RuletraderError> {
    Ok(BacktestConfig {
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
    })
}

/// Default threshold parameters with `[params]` overrides applied.
pub fn build_params(config: &dyn ConfigPort) -> Result<Params, RuletraderError> {
    let mut params = default_params();
    for key in config.section_keys("params") {
        let raw = config.get_string("params", &key).unwrap_or_default();
        let value: f64 = raw.trim().parse().map_err(|_| RuletraderError::ConfigInvalid {
            section: "params".into(),
            key: key.clone(),
            reason: format!("expected a number, got '{raw}'"),
        })?;
        params.insert(key, value);
    }
    Ok(params)
}

/// Default search bounds with `[ranges]` overrides applied. Each entry is
/// `name = low,high` with `low <= high`.
pub fn build_param_ranges(config: &dyn ConfigPort) -> Result<ParamRanges, RuletraderError> {
    let mut ranges = default_param_ranges();
    for key in config.section_keys("ranges") {
        let raw = config.get_string("ranges", &key).unwrap_or_default();
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(RuletraderError::ConfigInvalid {
                section: "ranges".into(),
                key: key.clone(),
                reason: format!("expected 'low,high', got '{raw}'"),
            });
        }
        let parse = |s: &str| -> Result<f64, RuletraderError> {
            s.parse().map_err(|_| RuletraderError::ConfigInvalid {
                section: "ranges".into(),
                key: key.clone(),
                reason: format!("expected a number, got '{s}'"),
            })
        };
        let low = parse(parts[0])?;
        let high = parse(parts[1])?;
        if low > high {
            return Err(RuletraderError::ConfigInvalid {
                section: "ranges".into(),
                key: key.clone(),
                reason: format!("low {low} exceeds high {high}"),
            });
        }
        ranges.insert(key, ParamRange::new(low, high));
    }
    Ok(ranges)
}
