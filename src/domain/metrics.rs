//! Fitness metrics over a backtest return series.
//!
//! Every function here is total: empty or zero-variance inputs produce a
//! defined 0.0, never NaN and never a panic.

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized Sharpe ratio: sqrt(252) * mean(excess) / stdev(excess), with
/// population standard deviation. 0.0 for empty or constant series.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let n = returns.len() as f64;
    let mean: f64 = returns.iter().map(|r| r - daily_rf).sum::<f64>() / n;
    let variance: f64 = returns
        .iter()
        .map(|r| {
            let excess = r - daily_rf;
            (excess - mean).powi(2)
        })
        .sum::<f64>()
        / n;
    let stddev = variance.sqrt();

    if stddev == 0.0 {
        return 0.0;
    }

    TRADING_DAYS_PER_YEAR.sqrt() * mean / stddev
}

/// Total compounded return: product of (1 + r) minus 1.
pub fn total_compounded_return(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Maximum drawdown over the cumulative compounded path: the minimum of
/// `(cum - peak) / (1 + peak)`. Zero or negative; 0.0 for empty input.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mut cum = 0.0_f64;
    let mut growth = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for r in returns {
        growth *= 1.0 + r;
        cum = growth - 1.0;
        if cum > peak {
            peak = cum;
        }
        let dd = (cum - peak) / (1.0 + peak);
        if dd < worst {
            worst = dd;
        }
    }

    worst
}

/// Fraction of non-zero return bars that were positive. Zero-return bars are
/// no bet, not a loss, so they are excluded from the denominator.
pub fn win_rate(returns: &[f64]) -> f64 {
    let mut nonzero = 0usize;
    let mut wins = 0usize;
    for r in returns {
        if *r != 0.0 {
            nonzero += 1;
            if *r > 0.0 {
                wins += 1;
            }
        }
    }
    if nonzero == 0 {
        return 0.0;
    }
    wins as f64 / nonzero as f64
}
