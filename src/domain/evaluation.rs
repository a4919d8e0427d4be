//! Single-candidate evaluation: one parameter configuration backtested into
//! a scored, explained strategy.

use serde::Serialize;

use crate::domain::backtest::run_backtest;
use crate::domain::error::RuletraderError;
use crate::domain::facts::{FactDefinition, Params};
use crate::domain::metrics::{max_drawdown, sharpe_ratio, total_compounded_return, win_rate};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rule::HornRule;

/// A parameter configuration paired with its backtest fitness. Created once
/// per evaluated configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStrategy {
    pub params: Params,
    pub sharpe: f64,
    pub total_return: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub num_trades: usize,
    pub explanation: String,
}

/// Backtest one configuration and package its metrics.
pub fn evaluate_candidate(
    params: &Params,
    bars: &[OhlcvBar],
    rules: &[HornRule],
    fact_definitions: &[FactDefinition],
    risk_free_rate: f64,
) -> Result<CandidateStrategy, RuletraderError> {
    let outcome = run_backtest(bars, params, rules, fact_definitions)?;

    let sharpe = sharpe_ratio(&outcome.returns, risk_free_rate);
    let total_return = total_compounded_return(&outcome.returns);
    let max_dd = max_drawdown(&outcome.returns);
    let wins = win_rate(&outcome.returns);
    let num_trades = outcome.num_trades();

    let explanation = format!(
        "Sharpe={sharpe:.3}, Return={:.2}%, MaxDD={:.2}%, WinRate={:.1}%, Trades={num_trades}",
        total_return * 100.0,
        max_dd * 100.0,
        wins * 100.0,
    );

    Ok(CandidateStrategy {
        params: params.clone(),
        sharpe,
        total_return,
        win_rate: wins,
        max_drawdown: max_dd,
        num_trades,
        explanation,
    })
}
