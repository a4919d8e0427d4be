//! Horn rule data structures.
//!
//! - `Literal`: a proposition reference with a negation flag, used as premises
//! - `HornRule`: IF all premises THEN conclusion, with an id for explainability
//! - `InferenceStep` / `InferenceResult`: the derivation trace one run produces

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::action::TradingAction;

/// Proposition name -> truth value for one inference run. A symbol absent
/// from the map evaluates false (closed-world assumption).
pub type TruthAssignment = HashMap<String, bool>;

/// A propositional symbol, optionally negated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub symbol: String,
    #[serde(default)]
    pub negated: bool,
}

impl Literal {
    pub fn positive(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            negated: false,
        }
    }

    pub fn negative(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            negated: true,
        }
    }

    /// Truth of this literal under `truth`; unknown symbols read as false.
    pub fn is_satisfied(&self, truth: &TruthAssignment) -> bool {
        let value = truth.get(&self.symbol).copied().unwrap_or(false);
        if self.negated { !value } else { value }
    }
}

/// IF all premises hold THEN the conclusion holds. The conclusion is always a
/// positive symbol; rules are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HornRule {
    pub rule_id: String,
    #[serde(default)]
    pub premises: Vec<Literal>,
    pub conclusion: String,
    #[serde(default)]
    pub description: String,
}

impl HornRule {
    pub fn new(rule_id: &str, premises: Vec<Literal>, conclusion: &str, description: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            premises,
            conclusion: conclusion.to_string(),
            description: description.to_string(),
        }
    }
}

/// One rule firing: which rule added which fact, and the exact literals that
/// satisfied it at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceStep {
    pub rule_id: String,
    pub added_fact: String,
    pub supporting_literals: Vec<Literal>,
}

/// Complete output of one inference run.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub action: TradingAction,
    /// True iff both BUY and SELL became true in the same run.
    pub conflict: bool,
    pub fired_rules: Vec<String>,
    pub chain: Vec<InferenceStep>,
    pub truth: TruthAssignment,
    /// Newly derived fact names, sorted.
    pub derived_facts: Vec<String>,
    /// True when the forward-chaining step limit cut the run short; the
    /// derived set may be incomplete.
    pub truncated: bool,
}
