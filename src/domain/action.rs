//! Trading action produced by one inference run.

use std::fmt;

/// Discrete decision for one bar. `Buy` and `Sell` double as the two reserved
/// proposition symbols the inference engine reads back out of a truth
/// assignment; `Hold` is the absence of a conclusion and has no symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradingAction {
    Buy,
    Sell,
    Hold,
}

/// Proposition symbol asserted by BUY-concluding rules.
pub const BUY_SYMBOL: &str = "BUY";
/// Proposition symbol asserted by SELL-concluding rules.
pub const SELL_SYMBOL: &str = "SELL";

impl TradingAction {
    /// The proposition symbol for this action, if it has one.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            TradingAction::Buy => Some(BUY_SYMBOL),
            TradingAction::Sell => Some(SELL_SYMBOL),
            TradingAction::Hold => None,
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, TradingAction::Hold)
    }
}

impl fmt::Display for TradingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingAction::Buy => write!(f, "BUY"),
            TradingAction::Sell => write!(f, "SELL"),
            TradingAction::Hold => write!(f, "HOLD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_symbols() {
        assert_eq!(TradingAction::Buy.to_string(), "BUY");
        assert_eq!(TradingAction::Sell.to_string(), "SELL");
        assert_eq!(TradingAction::Hold.to_string(), "HOLD");
    }

    #[test]
    fn only_buy_and_sell_have_symbols() {
        assert_eq!(TradingAction::Buy.symbol(), Some("BUY"));
        assert_eq!(TradingAction::Sell.symbol(), Some("SELL"));
        assert_eq!(TradingAction::Hold.symbol(), None);
    }

    #[test]
    fn hold_predicate() {
        assert!(TradingAction::Hold.is_hold());
        assert!(!TradingAction::Buy.is_hold());
        assert!(!TradingAction::Sell.is_hold());
    }
}
