//! Forward-chaining inference engine.
//!
//! # Semantics
//!
//! - Fixed-point iteration: full passes over the rule sequence until a pass
//!   fires nothing new
//! - Same-pass visibility: a fact derived earlier in a pass is visible to
//!   rules later in the same pass
//! - A rule fires once per run; re-asserting an already-true conclusion is a
//!   no-op and does not count against the step limit
//! - Rule precedence is the caller-supplied sequence order; callers wanting a
//!   different policy reorder the slice they pass

use crate::domain::action::{BUY_SYMBOL, SELL_SYMBOL, TradingAction};
use crate::domain::facts::{FactDefinition, Params, derive_facts};
use crate::domain::indicators::IndicatorSnapshot;
use crate::domain::rule::{
    HornRule, InferenceResult, InferenceStep, Literal, TruthAssignment,
};

/// Default bound on total firings per run. Well-formed acyclic rule sets
/// saturate long before this; hitting it marks the outcome truncated.
pub const MAX_CHAIN_STEPS: usize = 256;

/// Everything `forward_chain` produced in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    /// Conclusions established during the run, in derivation order.
    pub derived: Vec<String>,
    /// Ids of rules that fired, in firing order.
    pub fired: Vec<String>,
    /// One step per firing, for explainability.
    pub chain: Vec<InferenceStep>,
    /// True when the step limit ended the run before saturation.
    pub truncated: bool,
}

/// Apply Horn rules to `truth` until no new facts can be derived.
///
/// `truth` is extended in place as rules fire. `max_steps` bounds total
/// firings so a malformed rule set cannot loop; the limit being hit is
/// reported in-band via [`ChainOutcome::truncated`], never as an error.
pub fn forward_chain(
    truth: &mut TruthAssignment,
    rules: &[HornRule],
    max_steps: usize,
) -> ChainOutcome {
    let mut derived: Vec<String> = Vec::new();
    let mut fired: Vec<String> = Vec::new();
    let mut chain: Vec<InferenceStep> = Vec::new();

    let mut steps = 0;
    let mut changed = true;

    while changed {
        changed = false;
        for rule in rules {
            if derived.iter().any(|d| d == &rule.conclusion) {
                continue;
            }
            if truth.get(&rule.conclusion).copied().unwrap_or(false) {
                // Already true via seed facts or an earlier derivation.
                derived.push(rule.conclusion.clone());
                continue;
            }

            if rule.premises.iter().all(|lit| lit.is_satisfied(truth)) {
                truth.insert(rule.conclusion.clone(), true);
                derived.push(rule.conclusion.clone());
                fired.push(rule.rule_id.clone());
                chain.push(InferenceStep {
                    rule_id: rule.rule_id.clone(),
                    added_fact: rule.conclusion.clone(),
                    supporting_literals: rule.premises.clone(),
                });
                steps += 1;
                changed = true;

                if steps >= max_steps {
                    return ChainOutcome {
                        derived,
                        fired,
                        chain,
                        truncated: true,
                    };
                }
            }
        }
    }

    ChainOutcome {
        derived,
        fired,
        chain,
        truncated: false,
    }
}

/// Read the final action out of a truth assignment.
///
/// Simultaneous BUY and SELL is a defined HOLD outcome with the conflict
/// flag set, not an error.
pub fn choose_action(truth: &TruthAssignment) -> (TradingAction, bool) {
    let buy = truth.get(BUY_SYMBOL).copied().unwrap_or(false);
    let sell = truth.get(SELL_SYMBOL).copied().unwrap_or(false);
    match (buy, sell) {
        (true, true) => (TradingAction::Hold, true),
        (true, false) => (TradingAction::Buy, false),
        (false, true) => (TradingAction::Sell, false),
        (false, false) => (TradingAction::Hold, false),
    }
}

/// Main entrypoint: derive facts from a snapshot, chain the rules, choose an
/// action, and package the full result. No side effects beyond the return
/// value; the truth assignment is created fresh per call.
pub fn evaluate_snapshot(
    snapshot: &IndicatorSnapshot,
    rules: &[HornRule],
    fact_definitions: &[FactDefinition],
    params: &Params,
) -> InferenceResult {
    let mut truth = derive_facts(fact_definitions, snapshot, params);
    let outcome = forward_chain(&mut truth, rules, MAX_CHAIN_STEPS);
    let (action, conflict) = choose_action(&truth);

    let mut derived_facts = outcome.derived;
    derived_facts.sort();

    InferenceResult {
        action,
        conflict,
        fired_rules: outcome.fired,
        chain: outcome.chain,
        truth,
        derived_facts,
        truncated: outcome.truncated,
    }
}

/// Default trading rule set, organized by strategy family: momentum
/// continuation, mean-reversion pullbacks, volume confirmation, conservative
/// multi-confirmation, aggressive fast-entry, and low-volatility trends.
pub fn default_trading_rules() -> Vec<HornRule> {
    vec![
        HornRule::new(
            "BUY_MOMENTUM_1",
            vec![
                Literal::positive("RSI_OVERSOLD"),
                Literal::positive("MACD_POSITIVE"),
                Literal::positive("GOLDEN_CROSS"),
                Literal::negative("VOLATILITY_HIGH"),
            ],
            BUY_SYMBOL,
            "Classic momentum buy: oversold RSI, positive MACD, uptrend, volatility acceptable",
        ),
        HornRule::new(
            "BUY_MOMENTUM_STRONG",
            vec![
                Literal::positive("STRONG_UPTREND"),
                Literal::positive("MACD_STRONG_POSITIVE"),
                Literal::positive("VOLUME_HIGH"),
            ],
            BUY_SYMBOL,
            "Strong momentum buy: confirmed uptrend with strong MACD and volume",
        ),
        HornRule::new(
            "SELL_MOMENTUM_1",
            vec![
                Literal::positive("RSI_OVERBOUGHT"),
                Literal::positive("MACD_NEGATIVE"),
                Literal::positive("DEATH_CROSS"),
            ],
            SELL_SYMBOL,
            "Classic momentum sell: overbought RSI, negative MACD, downtrend",
        ),
        HornRule::new(
            "SELL_MOMENTUM_STRONG",
            vec![
                Literal::positive("STRONG_DOWNTREND"),
                Literal::positive("MACD_STRONG_NEGATIVE"),
                Literal::positive("VOLUME_HIGH"),
            ],
            SELL_SYMBOL,
            "Strong momentum sell: confirmed downtrend with strong bearish MACD and volume",
        ),
        HornRule::new(
            "BUY_PULLBACK",
            vec![
                Literal::positive("GOLDEN_CROSS"),
                Literal::positive("RSI_OVERSOLD"),
                Literal::negative("VOLATILITY_HIGH"),
            ],
            BUY_SYMBOL,
            "Pullback buy: temporarily oversold inside an uptrend",
        ),
        HornRule::new(
            "SELL_RALLY",
            vec![
                Literal::positive("DEATH_CROSS"),
                Literal::positive("RSI_OVERBOUGHT"),
                Literal::negative("VOLATILITY_HIGH"),
            ],
            SELL_SYMBOL,
            "Rally sell: temporarily overbought inside a downtrend",
        ),
        HornRule::new(
            "BUY_VOLUME_BREAKOUT",
            vec![
                Literal::positive("GOLDEN_CROSS"),
                Literal::positive("MACD_POSITIVE"),
                Literal::positive("VOLUME_SURGE"),
            ],
            BUY_SYMBOL,
            "Volume breakout buy: uptrend confirmed by a volume surge",
        ),
        HornRule::new(
            "SELL_VOLUME_BREAKDOWN",
            vec![
                Literal::positive("DEATH_CROSS"),
                Literal::positive("MACD_NEGATIVE"),
                Literal::positive("VOLUME_SURGE"),
            ],
            SELL_SYMBOL,
            "Volume breakdown sell: downtrend confirmed by a volume surge",
        ),
        HornRule::new(
            "BUY_CONSERVATIVE",
            vec![
                Literal::positive("RSI_OVERSOLD"),
                Literal::positive("MACD_POSITIVE"),
                Literal::positive("GOLDEN_CROSS"),
                Literal::positive("VOLUME_HIGH"),
                Literal::negative("VOLATILITY_HIGH"),
            ],
            BUY_SYMBOL,
            "Conservative buy: every bullish signal aligned",
        ),
        HornRule::new(
            "SELL_CONSERVATIVE",
            vec![
                Literal::positive("RSI_OVERBOUGHT"),
                Literal::positive("MACD_NEGATIVE"),
                Literal::positive("DEATH_CROSS"),
                Literal::positive("VOLUME_HIGH"),
                Literal::negative("VOLATILITY_HIGH"),
            ],
            SELL_SYMBOL,
            "Conservative sell: every bearish signal aligned",
        ),
        HornRule::new(
            "BUY_AGGRESSIVE",
            vec![
                Literal::positive("RSI_OVERSOLD"),
                Literal::positive("STRONG_UPTREND"),
            ],
            BUY_SYMBOL,
            "Aggressive buy: oversold in a strong uptrend",
        ),
        HornRule::new(
            "SELL_AGGRESSIVE",
            vec![
                Literal::positive("RSI_OVERBOUGHT"),
                Literal::positive("STRONG_DOWNTREND"),
            ],
            SELL_SYMBOL,
            "Aggressive sell: overbought in a strong downtrend",
        ),
        HornRule::new(
            "BUY_LOW_VOL",
            vec![
                Literal::positive("GOLDEN_CROSS"),
                Literal::positive("MACD_POSITIVE"),
                Literal::positive("VOLATILITY_LOW"),
            ],
            BUY_SYMBOL,
            "Low volatility buy: stable uptrend with positive momentum",
        ),
        HornRule::new(
            "SELL_LOW_VOL",
            vec![
                Literal::positive("DEATH_CROSS"),
                Literal::positive("MACD_NEGATIVE"),
                Literal::positive("VOLATILITY_LOW"),
            ],
            SELL_SYMBOL,
            "Low volatility sell: stable downtrend with negative momentum",
        ),
    ]
}

/// Vocabulary problems found by [`validate_vocabulary`]: typo-catching only,
/// never a change to closed-world inference semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyReport {
    /// Parameter keys referenced by a fact condition but absent from params.
    pub missing_params: Vec<String>,
    /// Premise symbols that are neither fact names, rule conclusions, nor
    /// the reserved action symbols.
    pub unknown_symbols: Vec<String>,
}

impl VocabularyReport {
    pub fn is_clean(&self) -> bool {
        self.missing_params.is_empty() && self.unknown_symbols.is_empty()
    }
}

/// Cross-check facts, rules, and params at construction time. A symbol only
/// ever referenced as a premise reads permanently false under the closed
/// world; reporting it here catches typos early.
pub fn validate_vocabulary(
    fact_definitions: &[FactDefinition],
    rules: &[HornRule],
    params: &Params,
) -> VocabularyReport {
    let mut missing_params: Vec<String> = Vec::new();
    for def in fact_definitions {
        for key in def.condition.referenced_params() {
            if !params.contains_key(key) && !missing_params.iter().any(|m| m == key) {
                missing_params.push(key.to_string());
            }
        }
    }

    let mut known: Vec<&str> = fact_definitions.iter().map(|d| d.name.as_str()).collect();
    known.extend(rules.iter().map(|r| r.conclusion.as_str()));
    known.push(BUY_SYMBOL);
    known.push(SELL_SYMBOL);

    let mut unknown_symbols: Vec<String> = Vec::new();
    for rule in rules {
        for premise in &rule.premises {
            if !known.contains(&premise.symbol.as_str())
                && !unknown_symbols.iter().any(|u| u == &premise.symbol)
            {
                unknown_symbols.push(premise.symbol.clone());
            }
        }
    }

    VocabularyReport {
        missing_params,
        unknown_symbols,
    }
}
