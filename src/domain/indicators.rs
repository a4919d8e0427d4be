//! Per-bar indicator snapshots computed from OHLCV history.
//!
//! The inference engine consumes one [`IndicatorSnapshot`] per bar. Snapshots
//! are undefined (`None`) inside the warm-up window and wherever a rolling
//! series has not produced a value yet; callers must treat undefined bars as
//! non-evaluable.

use crate::domain::ohlcv::OhlcvBar;

/// Bars before the slowest indicator (MA50) is considered defined.
pub const WARMUP_BARS: usize = 50;

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MA_SHORT: usize = 20;
const MA_LONG: usize = 50;
const VOLATILITY_WINDOW: usize = 20;

/// Complete numeric indicator state for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub ma20: f64,
    pub ma50: f64,
    pub volume: f64,
    /// Rolling stddev of returns; undefined until its window fills.
    pub volatility: Option<f64>,
}

/// RSI with Wilder smoothing (alpha = 1/period). NaN until the first delta,
/// and NaN whenever the smoothed loss is zero (no downside movement yet).
pub fn calc_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if closes.len() < 2 || period == 0 {
        return out;
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        if i == 1 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = (1.0 - alpha) * avg_gain + alpha * gain;
            avg_loss = (1.0 - alpha) * avg_loss + alpha * loss;
        }

        if avg_loss == 0.0 {
            out[i] = f64::NAN;
        } else {
            let rs = avg_gain / avg_loss;
            out[i] = 100.0 - 100.0 / (1.0 + rs);
        }
    }

    out
}

/// Exponential moving average, alpha = 2/(span+1), seeded at the first value.
fn calc_ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut ema = 0.0;
    for (i, &v) in values.iter().enumerate() {
        if i == 0 {
            ema = v;
        } else {
            ema = (1.0 - alpha) * ema + alpha * v;
        }
        out.push(ema);
    }
    out
}

/// MACD line: EMA(fast) minus EMA(slow) of closes.
pub fn calc_macd_line(closes: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    let ema_fast = calc_ema(closes, fast);
    let ema_slow = calc_ema(closes, slow);
    ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect()
}

/// Simple moving average. NaN until the window fills.
pub fn calc_sma(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = sum / window as f64;
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = sum / window as f64;
    }
    out
}

/// Rolling sample standard deviation of close-to-close returns.
///
/// The first return exists at index 1, so the series is NaN before index
/// `window`.
pub fn calc_return_volatility(closes: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if window < 2 || closes.len() < window + 1 {
        return out;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { w[1] / w[0] - 1.0 })
        .collect();

    for i in window..closes.len() {
        let slice = &returns[i - window..i];
        let n = slice.len() as f64;
        let mean = slice.iter().sum::<f64>() / n;
        let var = slice.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        out[i] = var.sqrt();
    }

    out
}

/// Compute a snapshot per bar. Output has the same length as `bars`; entries
/// are `None` for the first [`WARMUP_BARS`] bars and wherever any required
/// series is still undefined.
pub fn snapshots(bars: &[OhlcvBar]) -> Vec<Option<IndicatorSnapshot>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let rsi = calc_rsi(&closes, RSI_PERIOD);
    let macd = calc_macd_line(&closes, MACD_FAST, MACD_SLOW);
    let ma20 = calc_sma(&closes, MA_SHORT);
    let ma50 = calc_sma(&closes, MA_LONG);
    let volatility = calc_return_volatility(&closes, VOLATILITY_WINDOW);

    bars.iter()
        .enumerate()
        .map(|(idx, bar)| {
            if idx < WARMUP_BARS {
                return None;
            }
            let required = [rsi[idx], macd[idx], ma20[idx], ma50[idx]];
            if required.iter().any(|v| !v.is_finite()) {
                return None;
            }
            Some(IndicatorSnapshot {
                rsi: rsi[idx],
                macd: macd[idx],
                ma20: ma20[idx],
                ma50: ma50[idx],
                volume: bar.volume,
                volatility: volatility[idx].is_finite().then_some(volatility[idx]),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
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

    /// Alternating up/down closes so gains and losses both stay non-zero.
    fn oscillating_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + ((i % 7) as f64) - ((i % 3) as f64) * 1.5)
            .collect()
    }

    #[test]
    fn sma_window_averages() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = calc_sma(&values, 3);
        assert!(sma[0].is_nan());
        assert!(sma[1].is_nan());
        assert!((sma[2] - 2.0).abs() < 1e-12);
        assert!((sma[3] - 3.0).abs() < 1e-12);
        assert!((sma[4] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sma_short_input_is_all_nan() {
        let sma = calc_sma(&[1.0, 2.0], 3);
        assert!(sma.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_stays_in_unit_range() {
        let closes = oscillating_closes(100);
        let rsi = calc_rsi(&closes, 14);
        for v in rsi.iter().skip(1) {
            if v.is_finite() {
                assert!(*v >= 0.0 && *v <= 100.0, "rsi out of range: {v}");
            }
        }
    }

    #[test]
    fn rsi_all_gains_is_undefined() {
        // No downside movement: smoothed loss is zero, RSI undefined.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let rsi = calc_rsi(&closes, 14);
        assert!(rsi.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn macd_zero_for_constant_series() {
        let closes = vec![50.0; 60];
        let macd = calc_macd_line(&closes, 12, 26);
        for v in macd {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let macd = calc_macd_line(&closes, 12, 26);
        assert!(*macd.last().unwrap() > 0.0);
    }

    #[test]
    fn volatility_defined_after_window() {
        let closes = oscillating_closes(40);
        let vol = calc_return_volatility(&closes, 20);
        assert!(vol[19].is_nan());
        assert!(vol[20].is_finite());
        assert!(vol[20] >= 0.0);
    }

    #[test]
    fn volatility_zero_for_constant_series() {
        let closes = vec![100.0; 40];
        let vol = calc_return_volatility(&closes, 20);
        assert!(vol[20].abs() < 1e-12);
    }

    #[test]
    fn snapshots_respect_warmup() {
        let bars = bars_from_closes(&oscillating_closes(80));
        let snaps = snapshots(&bars);
        assert_eq!(snaps.len(), 80);
        for snap in snaps.iter().take(WARMUP_BARS) {
            assert!(snap.is_none());
        }
        assert!(snaps[WARMUP_BARS].is_some());
    }

    #[test]
    fn snapshot_carries_bar_volume() {
        let mut bars = bars_from_closes(&oscillating_closes(60));
        bars[55].volume = 2_500_000.0;
        let snaps = snapshots(&bars);
        let snap = snaps[55].as_ref().unwrap();
        assert!((snap.volume - 2_500_000.0).abs() < f64::EPSILON);
        assert!(snap.volatility.is_some());
    }
}
