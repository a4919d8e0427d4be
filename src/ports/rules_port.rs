//! Rule-set persistence port trait.

use crate::domain::error::RuletraderError;
use crate::domain::rule::HornRule;

/// Loads and saves Horn rule sets. A malformed record fails the whole load
/// with a descriptive error; partial rule sets are never returned.
pub trait RulesPort {
    fn load_rules(&self) -> Result<Vec<HornRule>, RuletraderError>;
    fn save_rules(&self, rules: &[HornRule]) -> Result<(), RuletraderError>;
}
