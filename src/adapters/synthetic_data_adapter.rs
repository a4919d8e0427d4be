//! Synthetic price-history adapter for testing without market data.
//!
//! Closes follow a seeded log random walk; highs, lows, opens, and volumes
//! are derived from them. The same seed always yields the same series.

use crate::domain::error::RuletraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DRIFT: f64 = 0.0005;
const DAILY_VOL: f64 = 0.015;
const WICK_VOL: f64 = 0.01;
const VOLUME_LOW: f64 = 500_000.0;
const VOLUME_HIGH: f64 = 2_000_000.0;

pub struct SyntheticDataAdapter {
    days: usize,
    seed: u64,
    start_date: NaiveDate,
}

impl SyntheticDataAdapter {
    pub fn new(days: usize, seed: u64) -> Self {
        Self {
            days,
            seed,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 2).expect("valid start date"),
        }
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    /// Standard normal draw via Box-Muller.
    fn normal(rng: &mut StdRng) -> f64 {
        let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = rng.gen_range(0.0..1.0);
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    fn next_weekday(date: NaiveDate) -> NaiveDate {
        let mut next = date + Duration::days(1);
        while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
            next += Duration::days(1);
        }
        next
    }
}

impl DataPort for SyntheticDataAdapter {
    fn load_ohlcv(&self) -> Result<Vec<OhlcvBar>, RuletraderError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut bars = Vec::with_capacity(self.days);

        let mut date = self.start_date;
        let mut close = 100.0_f64;
        let mut prev_close = close;

        for i in 0..self.days {
            let ret = DRIFT + DAILY_VOL * Self::normal(&mut rng);
            close *= ret.exp();

            let high = close * (1.0 + (WICK_VOL * Self::normal(&mut rng)).abs());
            let low = close * (1.0 - (WICK_VOL * Self::normal(&mut rng)).abs());
            let open = if i == 0 { close } else { prev_close };
            let volume = rng.gen_range(VOLUME_LOW..VOLUME_HIGH);

            bars.push(OhlcvBar {
                date,
                open,
                high: high.max(open).max(close),
                low: low.min(open).min(close),
                close,
                volume,
            });

            prev_close = close;
            date = Self::next_weekday(date);
        }

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::is_chronological;

    #[test]
    fn generates_requested_length() {
        let bars = SyntheticDataAdapter::new(252, 42).load_ohlcv().unwrap();
        assert_eq!(bars.len(), 252);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = SyntheticDataAdapter::new(100, 7).load_ohlcv().unwrap();
        let b = SyntheticDataAdapter::new(100, 7).load_ohlcv().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let a = SyntheticDataAdapter::new(100, 7).load_ohlcv().unwrap();
        let b = SyntheticDataAdapter::new(100, 8).load_ohlcv().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bars_are_chronological_weekdays() {
        let bars = SyntheticDataAdapter::new(60, 1).load_ohlcv().unwrap();
        assert!(is_chronological(&bars));
        for bar in &bars {
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn ohlc_invariants_hold() {
        let bars = SyntheticDataAdapter::new(120, 3).load_ohlcv().unwrap();
        for bar in &bars {
            assert!(bar.high >= bar.low);
            assert!(bar.high >= bar.close && bar.high >= bar.open);
            assert!(bar.low <= bar.close && bar.low <= bar.open);
            assert!(bar.volume >= VOLUME_LOW && bar.volume < VOLUME_HIGH);
            assert!(bar.close > 0.0);
        }
    }
}
