//! Local beam search over the threshold parameter space.
//!
//! The continuous space is discretized by a perturbation operator: each
//! parameter spawns two neighbors at +/- a fixed fraction of its interval
//! width, clamped back into bounds. Every unique configuration in a round is
//! scored by a full backtest and the best `beam_width` survive. Greedy and
//! local: quality depends on step fraction, beam width, and iteration count,
//! and no global optimum is guaranteed.

use std::collections::BTreeMap;
use std::collections::HashSet;

use rayon::prelude::*;

use crate::domain::error::RuletraderError;
use crate::domain::evaluation::{CandidateStrategy, evaluate_candidate};
use crate::domain::facts::{FactDefinition, Params};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rule::HornRule;

/// Closed interval bound for one searchable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub low: f64,
    pub high: f64,
}

impl ParamRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Search bounds by parameter name. BTreeMap so successor generation and
/// dedup visit parameters in a stable order.
pub type ParamRanges = BTreeMap<String, ParamRange>;

/// Beam search tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub beam_width: usize,
    pub top_k: usize,
    pub iterations: usize,
    /// Fraction of each parameter's interval width used as the perturbation
    /// step.
    pub step_fraction: f64,
    pub risk_free_rate: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            beam_width: 10,
            top_k: 10,
            iterations: 5,
            step_fraction: 0.1,
            risk_free_rate: 0.0,
        }
    }
}

/// Default search bounds for the default fact vocabulary.
pub fn default_param_ranges() -> ParamRanges {
    let mut ranges = ParamRanges::new();
    ranges.insert("rsi_oversold".into(), ParamRange::new(20.0, 40.0));
    ranges.insert("rsi_overbought".into(), ParamRange::new(60.0, 80.0));
    ranges.insert("rsi_neutral_low".into(), ParamRange::new(35.0, 45.0));
    ranges.insert("rsi_neutral_high".into(), ParamRange::new(55.0, 65.0));
    ranges.insert("macd_epsilon".into(), ParamRange::new(0.0, 0.1));
    ranges.insert("macd_strong_threshold".into(), ParamRange::new(0.3, 0.8));
    ranges.insert("ma_crossover_margin".into(), ParamRange::new(0.01, 0.05));
    ranges.insert("volume_high".into(), ParamRange::new(500_000.0, 2_000_000.0));
    ranges.insert("volume_surge_multiplier".into(), ParamRange::new(1.5, 3.0));
    ranges.insert("volume_average".into(), ParamRange::new(200_000.0, 800_000.0));
    ranges.insert("volatility_high".into(), ParamRange::new(0.02, 0.05));
    ranges.insert("volatility_low".into(), ParamRange::new(0.005, 0.02));
    ranges
}

/// Midpoint of every range: the initial search state.
pub fn midpoint_params(ranges: &ParamRanges) -> Params {
    ranges
        .iter()
        .map(|(name, range)| (name.clone(), range.midpoint()))
        .collect()
}

/// Clamp every bounded parameter back into its declared interval. Parameters
/// without a declared range pass through untouched.
pub fn clamp_params(params: &Params, ranges: &ParamRanges) -> Params {
    params
        .iter()
        .map(|(name, value)| {
            let clamped = match ranges.get(name) {
                Some(range) => range.clamp(*value),
                None => *value,
            };
            (name.clone(), clamped)
        })
        .collect()
}

/// Neighbors of one configuration: for each bounded parameter, step its value
/// up and down by `step_fraction` of the interval width, clamped into bounds.
pub fn successors(params: &Params, ranges: &ParamRanges, step_fraction: f64) -> Vec<Params> {
    let mut neighbors = Vec::with_capacity(2 * ranges.len());
    for (name, range) in ranges {
        let Some(current) = params.get(name) else {
            continue;
        };
        let step = step_fraction * range.width();
        for delta in [-step, step] {
            let mut neighbor = params.clone();
            neighbor.insert(name.clone(), *current + delta);
            neighbors.push(clamp_params(&neighbor, ranges));
        }
    }
    neighbors
}

/// Exact-value identity of a configuration, for duplicate collapsing.
fn config_key(params: &Params) -> Vec<(String, u64)> {
    params
        .iter()
        .map(|(name, value)| (name.clone(), value.to_bits()))
        .collect()
}

fn dedup_configs(configs: Vec<Params>) -> Vec<Params> {
    let mut seen: HashSet<Vec<(String, u64)>> = HashSet::new();
    let mut unique = Vec::new();
    for config in configs {
        if seen.insert(config_key(&config)) {
            unique.push(config);
        }
    }
    unique
}

/// Score every configuration concurrently. `par_iter` + ordered collect keeps
/// the result order identical to the input order, so selection never depends
/// on completion order.
fn score_all(
    configs: &[Params],
    bars: &[OhlcvBar],
    rules: &[HornRule],
    fact_definitions: &[FactDefinition],
    risk_free_rate: f64,
) -> Result<Vec<CandidateStrategy>, RuletraderError> {
    configs
        .par_iter()
        .map(|params| evaluate_candidate(params, bars, rules, fact_definitions, risk_free_rate))
        .collect()
}

fn sort_by_sharpe_desc(candidates: &mut [CandidateStrategy]) {
    // Stable sort: ties retain pool order.
    candidates.sort_by(|a, b| {
        b.sharpe
            .partial_cmp(&a.sharpe)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Beam search over the parameter space.
///
/// Starts from the interval midpoints, expands every beam member's
/// neighbors, scores the deduplicated pool by backtest Sharpe ratio, and
/// keeps the best `beam_width` per round. Returns at most
/// `min(top_k, beam_width)` candidates, Sharpe descending.
pub fn beam_search(
    bars: &[OhlcvBar],
    ranges: &ParamRanges,
    rules: &[HornRule],
    fact_definitions: &[FactDefinition],
    config: &SearchConfig,
) -> Result<Vec<CandidateStrategy>, RuletraderError> {
    let mut beam: Vec<Params> = vec![midpoint_params(ranges)];

    for _ in 0..config.iterations {
        let mut pool: Vec<Params> = beam.clone();
        for params in &beam {
            pool.extend(successors(params, ranges, config.step_fraction));
        }
        let unique = dedup_configs(pool);

        let mut scored = score_all(
            &unique,
            bars,
            rules,
            fact_definitions,
            config.risk_free_rate,
        )?;
        sort_by_sharpe_desc(&mut scored);
        scored.truncate(config.beam_width);
        beam = scored.into_iter().map(|c| c.params).collect();
    }

    let mut finalists = score_all(
        &beam,
        bars,
        rules,
        fact_definitions,
        config.risk_free_rate,
    )?;
    sort_by_sharpe_desc(&mut finalists);
    finalists.truncate(config.top_k);
    Ok(finalists)
}
