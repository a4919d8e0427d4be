#![allow(dead_code)]

use chrono::NaiveDate;
pub use ruletrader::domain::ohlcv::OhlcvBar;
use std::io::Write;

/// Bars from explicit closes, one calendar day apart.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: c,
            high: c * 1.01,
            low: c * 0.99,
            close: c,
            volume: 1_000_000.0,
        })
        .collect()
}

/// Deterministic choppy closes with both gains and losses, so RSI and
/// volatility stay defined past the warm-up window.
pub fn oscillating_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + ((i % 7) as f64) - ((i % 3) as f64) * 1.5)
        .collect()
}

pub fn write_temp_csv(bars: &[OhlcvBar]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "date,open,high,low,close,volume").unwrap();
    for bar in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            bar.date.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
