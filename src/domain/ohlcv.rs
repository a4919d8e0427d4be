//! OHLCV bar representation.

use chrono::NaiveDate;

/// One price bar. Sequences of bars are always chronological; adapters sort
/// on load and the domain never reorders them.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Close-to-close simple return from this bar to `next`.
    pub fn return_to(&self, next: &OhlcvBar) -> f64 {
        if self.close == 0.0 {
            0.0
        } else {
            next.close / self.close - 1.0
        }
    }
}

/// True when every consecutive pair of bars is in non-decreasing date order.
pub fn is_chronological(bars: &[OhlcvBar]) -> bool {
    bars.windows(2).all(|w| w[0].date <= w[1].date)
}
