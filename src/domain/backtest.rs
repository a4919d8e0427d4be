//! Backtest replay: rules evaluated bar-by-bar into a return series.
//!
//! The action decided at the close of bar t sets the exposure held into bar
//! t+1's price move; there is no same-bar look-ahead. Warm-up bars and bars
//! with undefined indicators contribute a zero return and a HOLD placeholder.

use crate::domain::action::TradingAction;
use crate::domain::engine::evaluate_snapshot;
use crate::domain::error::RuletraderError;
use crate::domain::facts::{FactDefinition, Params};
use crate::domain::indicators::{snapshots, WARMUP_BARS};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rule::HornRule;

/// Per-bar output of one backtest. Both vectors have length
/// `bars.len() - 1 - WARMUP_BARS`.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOutcome {
    pub returns: Vec<f64>,
    pub actions: Vec<TradingAction>,
}

impl BacktestOutcome {
    /// Bars on which a non-HOLD action was taken.
    pub fn num_trades(&self) -> usize {
        self.actions.iter().filter(|a| !a.is_hold()).count()
    }
}

/// Replay the inference engine over a price history.
///
/// Position state machine: BUY sets +1, SELL sets -1, HOLD keeps the current
/// position (initially flat). Realized return per bar is
/// `position * (close[t+1]/close[t] - 1)`.
pub fn run_backtest(
    bars: &[OhlcvBar],
    params: &Params,
    rules: &[HornRule],
    fact_definitions: &[FactDefinition],
) -> Result<BacktestOutcome, RuletraderError> {
    let minimum = WARMUP_BARS + 2;
    if bars.len() < minimum {
        return Err(RuletraderError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }

    let snaps = snapshots(bars);

    let mut returns = Vec::with_capacity(bars.len() - 1 - WARMUP_BARS);
    let mut actions = Vec::with_capacity(bars.len() - 1 - WARMUP_BARS);
    let mut position: i32 = 0;

    for idx in WARMUP_BARS..bars.len() - 1 {
        let action = match &snaps[idx] {
            Some(snapshot) => {
                evaluate_snapshot(snapshot, rules, fact_definitions, params).action
            }
            None => {
                // Indicators undefined: no bet on this bar.
                returns.push(0.0);
                actions.push(TradingAction::Hold);
                continue;
            }
        };
        actions.push(action);

        match action {
            TradingAction::Buy => position = 1,
            TradingAction::Sell => position = -1,
            TradingAction::Hold => {}
        }

        let bar_return = bars[idx].return_to(&bars[idx + 1]);
        returns.push(position as f64 * bar_return);
    }

    Ok(BacktestOutcome { returns, actions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::default_trading_rules;
    use crate::domain::facts::{default_fact_definitions, default_params};
    use crate::domain::rule::{HornRule, Literal};
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: c,
                high: c * 1.01,
                low: c * 0.99,
                close: c,
                volume: 1_000_000.0,
            })
            .collect()
    }

    fn oscillating_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + ((i % 7) as f64) - ((i % 3) as f64) * 1.5)
            .collect()
    }

    #[test]
    fn output_lengths_match_contract() {
        let n = 80;
        let bars = bars_from_closes(&oscillating_closes(n));
        let outcome = run_backtest(
            &bars,
            &default_params(),
            &default_trading_rules(),
            &default_fact_definitions(),
        )
        .unwrap();

        assert_eq!(outcome.returns.len(), n - 1 - WARMUP_BARS);
        assert_eq!(outcome.actions.len(), n - 1 - WARMUP_BARS);
    }

    #[test]
    fn too_few_bars_is_an_error() {
        let bars = bars_from_closes(&oscillating_closes(WARMUP_BARS + 1));
        let err = run_backtest(
            &bars,
            &default_params(),
            &default_trading_rules(),
            &default_fact_definitions(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RuletraderError::InsufficientData { bars: 51, minimum: 52 }
        ));
    }

    #[test]
    fn empty_rule_set_stays_flat() {
        let bars = bars_from_closes(&oscillating_closes(80));
        let outcome = run_backtest(
            &bars,
            &default_params(),
            &[],
            &default_fact_definitions(),
        )
        .unwrap();

        assert!(outcome.actions.iter().all(|a| a.is_hold()));
        assert!(outcome.returns.iter().all(|r| *r == 0.0));
        assert_eq!(outcome.num_trades(), 0);
    }

    #[test]
    fn always_buy_rule_tracks_price_moves() {
        let bars = bars_from_closes(&oscillating_closes(80));
        let always_buy = vec![HornRule::new("ALWAYS_BUY", vec![], "BUY", "")];
        let outcome = run_backtest(
            &bars,
            &default_params(),
            &always_buy,
            &default_fact_definitions(),
        )
        .unwrap();

        for (i, idx) in (WARMUP_BARS..bars.len() - 1).enumerate() {
            let expected = bars[idx].return_to(&bars[idx + 1]);
            assert!(
                (outcome.returns[i] - expected).abs() < 1e-12,
                "bar {idx}: long exposure should track the next close move"
            );
            assert_eq!(outcome.actions[i], TradingAction::Buy);
        }
    }

    #[test]
    fn sell_holds_short_exposure_through_holds() {
        // One SELL when RSI is overbought, then HOLD keeps the short on.
        let rules = vec![HornRule::new(
            "SELL_HOT",
            vec![Literal::positive("RSI_OVERBOUGHT")],
            "SELL",
            "",
        )];
        // Strong rises with token dips: RSI sits deep in overbought territory
        // while staying defined (losses are non-zero).
        let mut closes = Vec::with_capacity(80);
        let mut c = 100.0;
        for i in 0..80 {
            closes.push(c);
            c += if i % 2 == 0 { 2.0 } else { -0.1 };
        }
        let bars = bars_from_closes(&closes);
        let outcome = run_backtest(
            &bars,
            &default_params(),
            &rules,
            &default_fact_definitions(),
        )
        .unwrap();

        // Once a SELL happens, every later return is short exposure
        // (position * move), even on HOLD bars.
        if let Some(first_sell) = outcome
            .actions
            .iter()
            .position(|a| *a == TradingAction::Sell)
        {
            for (i, ret) in outcome.returns.iter().enumerate().skip(first_sell) {
                let idx = WARMUP_BARS + i;
                let expected = -bars[idx].return_to(&bars[idx + 1]);
                assert!((ret - expected).abs() < 1e-12, "bar {idx}");
            }
        } else {
            panic!("expected at least one SELL action in the replay");
        }
    }
}
