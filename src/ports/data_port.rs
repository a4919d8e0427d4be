//! Price-history access port trait.

use crate::domain::error::RuletraderError;
use crate::domain::ohlcv::OhlcvBar;

/// Supplies one ordered OHLCV series. Implementations must return bars in
/// chronological order; the domain never reorders them.
pub trait DataPort {
    fn load_ohlcv(&self) -> Result<Vec<OhlcvBar>, RuletraderError>;
}
