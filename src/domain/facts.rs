//! Fact derivation: numeric indicator snapshots to named boolean propositions.
//!
//! Conditions are a closed enum interpreted against a snapshot and a
//! parameter map, so a fact set is plain data and can round-trip through
//! configuration without carrying executable code.

use std::collections::BTreeMap;

use crate::domain::indicators::IndicatorSnapshot;
use crate::domain::rule::TruthAssignment;

/// Threshold parameters by name. BTreeMap so iteration order is stable.
pub type Params = BTreeMap<String, f64>;

/// Numeric field of a snapshot a condition can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorField {
    Rsi,
    Macd,
    Ma20,
    Ma50,
    Volume,
    Volatility,
}

impl IndicatorField {
    /// Field value for a snapshot; `None` when volatility is undefined.
    fn value(&self, snapshot: &IndicatorSnapshot) -> Option<f64> {
        match self {
            IndicatorField::Rsi => Some(snapshot.rsi),
            IndicatorField::Macd => Some(snapshot.macd),
            IndicatorField::Ma20 => Some(snapshot.ma20),
            IndicatorField::Ma50 => Some(snapshot.ma50),
            IndicatorField::Volume => Some(snapshot.volume),
            IndicatorField::Volatility => snapshot.volatility,
        }
    }
}

/// Threshold comparison evaluated by a small interpreter.
///
/// Any condition touching an undefined field or a missing parameter key
/// evaluates to false; `referenced_params` lets callers validate keys up
/// front instead of discovering typos as permanently-false facts.
#[derive(Debug, Clone, PartialEq)]
pub enum FactCondition {
    /// field < params[key]
    BelowParam { field: IndicatorField, key: String },
    /// field > params[key]
    AboveParam { field: IndicatorField, key: String },
    /// field < -params[key]
    BelowNegParam { field: IndicatorField, key: String },
    /// params[low] <= field <= params[high]
    WithinParams {
        field: IndicatorField,
        low: String,
        high: String,
    },
    /// left > right
    FieldAbove {
        left: IndicatorField,
        right: IndicatorField,
    },
    /// left < right
    FieldBelow {
        left: IndicatorField,
        right: IndicatorField,
    },
    /// left > right * (1 + params[margin])
    RatioAbove {
        left: IndicatorField,
        right: IndicatorField,
        margin: String,
    },
    /// left < right * (1 - params[margin])
    RatioBelow {
        left: IndicatorField,
        right: IndicatorField,
        margin: String,
    },
    /// field > params[mult] * params[base]
    AboveScaledParam {
        field: IndicatorField,
        mult: String,
        base: String,
    },
}

impl FactCondition {
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot, params: &Params) -> bool {
        match self {
            FactCondition::BelowParam { field, key } => {
                match (field.value(snapshot), params.get(key)) {
                    (Some(v), Some(t)) => v < *t,
                    _ => false,
                }
            }
            FactCondition::AboveParam { field, key } => {
                match (field.value(snapshot), params.get(key)) {
                    (Some(v), Some(t)) => v > *t,
                    _ => false,
                }
            }
            FactCondition::BelowNegParam { field, key } => {
                match (field.value(snapshot), params.get(key)) {
                    (Some(v), Some(t)) => v < -*t,
                    _ => false,
                }
            }
            FactCondition::WithinParams { field, low, high } => {
                match (field.value(snapshot), params.get(low), params.get(high)) {
                    (Some(v), Some(lo), Some(hi)) => v >= *lo && v <= *hi,
                    _ => false,
                }
            }
            FactCondition::FieldAbove { left, right } => {
                match (left.value(snapshot), right.value(snapshot)) {
                    (Some(l), Some(r)) => l > r,
                    _ => false,
                }
            }
            FactCondition::FieldBelow { left, right } => {
                match (left.value(snapshot), right.value(snapshot)) {
                    (Some(l), Some(r)) => l < r,
                    _ => false,
                }
            }
            FactCondition::RatioAbove {
                left,
                right,
                margin,
            } => {
                match (
                    left.value(snapshot),
                    right.value(snapshot),
                    params.get(margin),
                ) {
                    (Some(l), Some(r), Some(m)) => l > r * (1.0 + m),
                    _ => false,
                }
            }
            FactCondition::RatioBelow {
                left,
                right,
                margin,
            } => {
                match (
                    left.value(snapshot),
                    right.value(snapshot),
                    params.get(margin),
                ) {
                    (Some(l), Some(r), Some(m)) => l < r * (1.0 - m),
                    _ => false,
                }
            }
            FactCondition::AboveScaledParam { field, mult, base } => {
                match (
                    field.value(snapshot),
                    params.get(mult),
                    params.get(base),
                ) {
                    (Some(v), Some(m), Some(b)) => v > m * b,
                    _ => false,
                }
            }
        }
    }

    /// Parameter keys this condition reads.
    pub fn referenced_params(&self) -> Vec<&str> {
        match self {
            FactCondition::BelowParam { key, .. }
            | FactCondition::AboveParam { key, .. }
            | FactCondition::BelowNegParam { key, .. } => vec![key],
            FactCondition::WithinParams { low, high, .. } => vec![low, high],
            FactCondition::FieldAbove { .. } | FactCondition::FieldBelow { .. } => vec![],
            FactCondition::RatioAbove { margin, .. }
            | FactCondition::RatioBelow { margin, .. } => vec![margin],
            FactCondition::AboveScaledParam { mult, base, .. } => vec![mult, base],
        }
    }
}

/// A named boolean proposition derived from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct FactDefinition {
    pub name: String,
    pub condition: FactCondition,
    pub description: String,
}

impl FactDefinition {
    pub fn new(name: &str, condition: FactCondition, description: &str) -> Self {
        Self {
            name: name.to_string(),
            condition,
            description: description.to_string(),
        }
    }
}

/// Evaluate every fact definition against one snapshot, producing the seed
/// truth assignment for an inference run.
pub fn derive_facts(
    definitions: &[FactDefinition],
    snapshot: &IndicatorSnapshot,
    params: &Params,
) -> TruthAssignment {
    definitions
        .iter()
        .map(|d| (d.name.clone(), d.condition.evaluate(snapshot, params)))
        .collect()
}

/// Default threshold parameters matching [`default_fact_definitions`].
pub fn default_params() -> Params {
    let mut p = Params::new();
    p.insert("rsi_oversold".into(), 30.0);
    p.insert("rsi_overbought".into(), 70.0);
    p.insert("rsi_neutral_low".into(), 40.0);
    p.insert("rsi_neutral_high".into(), 60.0);
    p.insert("macd_epsilon".into(), 0.0);
    p.insert("macd_strong_threshold".into(), 0.5);
    p.insert("ma_crossover_margin".into(), 0.02);
    p.insert("volume_high".into(), 1_000_000.0);
    p.insert("volume_surge_multiplier".into(), 2.0);
    p.insert("volume_average".into(), 500_000.0);
    p.insert("volatility_high".into(), 0.03);
    p.insert("volatility_low".into(), 0.01);
    p
}

/// Default fact vocabulary covering every symbol the default rule set uses.
pub fn default_fact_definitions() -> Vec<FactDefinition> {
    use FactCondition::*;
    use IndicatorField::*;

    vec![
        FactDefinition::new(
            "RSI_OVERSOLD",
            BelowParam {
                field: Rsi,
                key: "rsi_oversold".into(),
            },
            "RSI indicates oversold conditions",
        ),
        FactDefinition::new(
            "RSI_OVERBOUGHT",
            AboveParam {
                field: Rsi,
                key: "rsi_overbought".into(),
            },
            "RSI indicates overbought conditions",
        ),
        FactDefinition::new(
            "RSI_NEUTRAL",
            WithinParams {
                field: Rsi,
                low: "rsi_neutral_low".into(),
                high: "rsi_neutral_high".into(),
            },
            "RSI is inside its neutral band",
        ),
        FactDefinition::new(
            "MACD_POSITIVE",
            AboveParam {
                field: Macd,
                key: "macd_epsilon".into(),
            },
            "MACD is positive (bullish momentum)",
        ),
        FactDefinition::new(
            "MACD_NEGATIVE",
            BelowNegParam {
                field: Macd,
                key: "macd_epsilon".into(),
            },
            "MACD is negative (bearish momentum)",
        ),
        FactDefinition::new(
            "MACD_STRONG_POSITIVE",
            AboveParam {
                field: Macd,
                key: "macd_strong_threshold".into(),
            },
            "MACD is strongly positive",
        ),
        FactDefinition::new(
            "MACD_STRONG_NEGATIVE",
            BelowNegParam {
                field: Macd,
                key: "macd_strong_threshold".into(),
            },
            "MACD is strongly negative",
        ),
        FactDefinition::new(
            "GOLDEN_CROSS",
            FieldAbove {
                left: Ma20,
                right: Ma50,
            },
            "MA20 above MA50 (uptrend)",
        ),
        FactDefinition::new(
            "DEATH_CROSS",
            FieldBelow {
                left: Ma20,
                right: Ma50,
            },
            "MA20 below MA50 (downtrend)",
        ),
        FactDefinition::new(
            "STRONG_UPTREND",
            RatioAbove {
                left: Ma20,
                right: Ma50,
                margin: "ma_crossover_margin".into(),
            },
            "MA20 above MA50 by the crossover margin",
        ),
        FactDefinition::new(
            "STRONG_DOWNTREND",
            RatioBelow {
                left: Ma20,
                right: Ma50,
                margin: "ma_crossover_margin".into(),
            },
            "MA20 below MA50 by the crossover margin",
        ),
        FactDefinition::new(
            "VOLUME_HIGH",
            AboveParam {
                field: Volume,
                key: "volume_high".into(),
            },
            "Volume is above the high-volume threshold",
        ),
        FactDefinition::new(
            "VOLUME_SURGE",
            AboveScaledParam {
                field: Volume,
                mult: "volume_surge_multiplier".into(),
                base: "volume_average".into(),
            },
            "Volume is a multiple of its average level",
        ),
        FactDefinition::new(
            "VOLATILITY_HIGH",
            AboveParam {
                field: Volatility,
                key: "volatility_high".into(),
            },
            "Volatility is above the high-volatility threshold",
        ),
        FactDefinition::new(
            "VOLATILITY_LOW",
            BelowParam {
                field: Volatility,
                key: "volatility_low".into(),
            },
            "Volatility is below the low-volatility threshold",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 25.0,
            macd: 1.0,
            ma20: 105.0,
            ma50: 100.0,
            volume: 2_000_000.0,
            volatility: Some(0.01),
        }
    }

    #[test]
    fn threshold_conditions() {
        let params = default_params();
        let snap = snapshot();

        let oversold = FactCondition::BelowParam {
            field: IndicatorField::Rsi,
            key: "rsi_oversold".into(),
        };
        assert!(oversold.evaluate(&snap, &params));

        let overbought = FactCondition::AboveParam {
            field: IndicatorField::Rsi,
            key: "rsi_overbought".into(),
        };
        assert!(!overbought.evaluate(&snap, &params));
    }

    #[test]
    fn negated_threshold_condition() {
        let mut params = default_params();
        params.insert("macd_strong_threshold".into(), 0.5);
        let mut snap = snapshot();
        snap.macd = -0.8;

        let strong_negative = FactCondition::BelowNegParam {
            field: IndicatorField::Macd,
            key: "macd_strong_threshold".into(),
        };
        assert!(strong_negative.evaluate(&snap, &params));

        snap.macd = -0.2;
        assert!(!strong_negative.evaluate(&snap, &params));
    }

    #[test]
    fn interval_condition_is_inclusive() {
        let params = default_params();
        let mut snap = snapshot();

        snap.rsi = 40.0;
        let neutral = FactCondition::WithinParams {
            field: IndicatorField::Rsi,
            low: "rsi_neutral_low".into(),
            high: "rsi_neutral_high".into(),
        };
        assert!(neutral.evaluate(&snap, &params));

        snap.rsi = 60.0;
        assert!(neutral.evaluate(&snap, &params));

        snap.rsi = 60.1;
        assert!(!neutral.evaluate(&snap, &params));
    }

    #[test]
    fn ratio_margin_conditions() {
        let params = default_params();
        let snap = snapshot(); // ma20=105, ma50=100, margin=0.02

        let strong_up = FactCondition::RatioAbove {
            left: IndicatorField::Ma20,
            right: IndicatorField::Ma50,
            margin: "ma_crossover_margin".into(),
        };
        assert!(strong_up.evaluate(&snap, &params));

        let mut flat = snap.clone();
        flat.ma20 = 101.0; // above, but inside the margin
        assert!(!strong_up.evaluate(&flat, &params));
    }

    #[test]
    fn scaled_param_condition() {
        let params = default_params(); // surge = 2.0 * 500k = 1M
        let snap = snapshot();

        let surge = FactCondition::AboveScaledParam {
            field: IndicatorField::Volume,
            mult: "volume_surge_multiplier".into(),
            base: "volume_average".into(),
        };
        assert!(surge.evaluate(&snap, &params));

        let mut quiet = snap.clone();
        quiet.volume = 900_000.0;
        assert!(!surge.evaluate(&quiet, &params));
    }

    #[test]
    fn undefined_volatility_is_false() {
        let params = default_params();
        let mut snap = snapshot();
        snap.volatility = None;

        let high = FactCondition::AboveParam {
            field: IndicatorField::Volatility,
            key: "volatility_high".into(),
        };
        let low = FactCondition::BelowParam {
            field: IndicatorField::Volatility,
            key: "volatility_low".into(),
        };
        assert!(!high.evaluate(&snap, &params));
        assert!(!low.evaluate(&snap, &params));
    }

    #[test]
    fn missing_param_is_false() {
        let params = Params::new();
        let snap = snapshot();
        let cond = FactCondition::BelowParam {
            field: IndicatorField::Rsi,
            key: "rsi_oversold".into(),
        };
        assert!(!cond.evaluate(&snap, &params));
    }

    #[test]
    fn derive_facts_seeds_assignment() {
        let defs = default_fact_definitions();
        let params = default_params();
        let truth = derive_facts(&defs, &snapshot(), &params);

        assert_eq!(truth.len(), defs.len());
        assert_eq!(truth.get("RSI_OVERSOLD"), Some(&true));
        assert_eq!(truth.get("MACD_POSITIVE"), Some(&true));
        assert_eq!(truth.get("MACD_STRONG_POSITIVE"), Some(&true));
        assert_eq!(truth.get("GOLDEN_CROSS"), Some(&true));
        assert_eq!(truth.get("STRONG_UPTREND"), Some(&true));
        assert_eq!(truth.get("VOLUME_HIGH"), Some(&true));
        assert_eq!(truth.get("VOLUME_SURGE"), Some(&true));
        assert_eq!(truth.get("VOLATILITY_HIGH"), Some(&false));
        assert_eq!(truth.get("RSI_OVERBOUGHT"), Some(&false));
        assert_eq!(truth.get("DEATH_CROSS"), Some(&false));
    }

    #[test]
    fn default_params_cover_default_facts() {
        let params = default_params();
        for def in default_fact_definitions() {
            for key in def.condition.referenced_params() {
                assert!(params.contains_key(key), "missing param {key}");
            }
        }
    }
}
