//! JSON rule-set persistence adapter.
//!
//! Accepted file shapes: a bare array of rule records, or an object with a
//! `rules` key holding that array. A record is
//! `{rule_id, premises: [{symbol, negated?}], conclusion, description?}`;
//! `negated` defaults to false. Any malformed record fails the whole load.

use crate::domain::error::RuletraderError;
use crate::domain::rule::HornRule;
use crate::ports::rules_port::RulesPort;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub struct JsonRulesAdapter {
    path: PathBuf,
}

impl JsonRulesAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse_error(&self, reason: String) -> RuletraderError {
        RuletraderError::RulesParse {
            file: self.path.display().to_string(),
            reason,
        }
    }
}

/// Build rules from already-parsed JSON. Split out so in-memory rule sets
/// (tests, future transports) share the exact load validation.
pub fn rules_from_value(data: &Value) -> Result<Vec<HornRule>, RuletraderError> {
    let records = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("rules") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                return Err(RuletraderError::RuleInvalid {
                    reason: format!("'rules' must be a list, got {}", type_name(other)),
                });
            }
            None => {
                return Err(RuletraderError::RuleInvalid {
                    reason: "expected a list of rules or an object with a 'rules' key".into(),
                });
            }
        },
        other => {
            return Err(RuletraderError::RuleInvalid {
                reason: format!(
                    "expected a list of rules or an object with a 'rules' key, got {}",
                    type_name(other)
                ),
            });
        }
    };

    records.iter().map(parse_rule).collect()
}

fn parse_rule(record: &Value) -> Result<HornRule, RuletraderError> {
    let Value::Object(map) = record else {
        return Err(RuletraderError::RuleInvalid {
            reason: format!("each rule must be an object, got {}", type_name(record)),
        });
    };

    // premises must be a list when present; catching the shape error here
    // gives a better message than serde's untyped one.
    if let Some(premises) = map.get("premises") {
        if !premises.is_array() {
            return Err(RuletraderError::RuleInvalid {
                reason: format!(
                    "'premises' must be a list, got {}",
                    type_name(premises)
                ),
            });
        }
    }

    let rule: HornRule =
        serde_json::from_value(record.clone()).map_err(|e| RuletraderError::RuleInvalid {
            reason: e.to_string(),
        })?;

    if rule.rule_id.trim().is_empty() {
        return Err(RuletraderError::RuleInvalid {
            reason: "rule must have a non-empty 'rule_id'".into(),
        });
    }
    if rule.conclusion.trim().is_empty() {
        return Err(RuletraderError::RuleInvalid {
            reason: format!("rule '{}' must have a non-empty 'conclusion'", rule.rule_id),
        });
    }
    for premise in &rule.premises {
        if premise.symbol.trim().is_empty() {
            return Err(RuletraderError::RuleInvalid {
                reason: format!("rule '{}' has a premise with an empty symbol", rule.rule_id),
            });
        }
    }

    Ok(rule)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

impl RulesPort for JsonRulesAdapter {
    fn load_rules(&self) -> Result<Vec<HornRule>, RuletraderError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| self.parse_error(format!("failed to read file: {e}")))?;
        let data: Value = serde_json::from_str(&content)
            .map_err(|e| self.parse_error(format!("invalid JSON: {e}")))?;
        rules_from_value(&data)
    }

    fn save_rules(&self, rules: &[HornRule]) -> Result<(), RuletraderError> {
        let wrapped = serde_json::json!({ "rules": rules });
        let pretty = serde_json::to_string_pretty(&wrapped)
            .map_err(|e| self.parse_error(format!("serialization error: {e}")))?;
        fs::write(&self.path, pretty)
            .map_err(|e| self.parse_error(format!("failed to write file: {e}")))?;
        Ok(())
    }
}
