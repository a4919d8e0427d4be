//! CSV file price-history adapter.
//!
//! Expects a header row and `date,open,high,low,close,volume` columns with
//! ISO dates. Bars are sorted chronologically on load.

use crate::domain::error::RuletraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvDataAdapter {
    path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn field<'a>(
        record: &'a csv::StringRecord,
        index: usize,
        name: &str,
    ) -> Result<&'a str, RuletraderError> {
        record.get(index).ok_or_else(|| RuletraderError::Data {
            reason: format!("missing {name} column"),
        })
    }

    fn parse_number(value: &str, name: &str) -> Result<f64, RuletraderError> {
        value.trim().parse().map_err(|e| RuletraderError::Data {
            reason: format!("invalid {name} value '{value}': {e}"),
        })
    }
}

impl DataPort for CsvDataAdapter {
    fn load_ohlcv(&self) -> Result<Vec<OhlcvBar>, RuletraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| RuletraderError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| RuletraderError::Data {
                reason: format!("CSV parse error: {e}"),
            })?;

            let date_str = Self::field(&record, 0, "date")?;
            let date =
                NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                    RuletraderError::Data {
                        reason: format!("invalid date '{date_str}': {e}"),
                    }
                })?;

            bars.push(OhlcvBar {
                date,
                open: Self::parse_number(Self::field(&record, 1, "open")?, "open")?,
                high: Self::parse_number(Self::field(&record, 2, "high")?, "high")?,
                low: Self::parse_number(Self::field(&record, 3, "low")?, "low")?,
                close: Self::parse_number(Self::field(&record, 4, "close")?, "close")?,
                volume: Self::parse_number(Self::field(&record, 5, "volume")?, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

/// Write bars out in the same CSV shape the adapter reads.
pub fn write_ohlcv_csv(path: &PathBuf, bars: &[OhlcvBar]) -> Result<(), RuletraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| RuletraderError::Data {
        reason: format!("failed to create {}: {}", path.display(), e),
    })?;

    wtr.write_record(["date", "open", "high", "low", "close", "volume"])
        .map_err(|e| RuletraderError::Data {
            reason: format!("CSV write error: {e}"),
        })?;
    for bar in bars {
        wtr.write_record([
            bar.date.format("%Y-%m-%d").to_string(),
            format!("{}", bar.open),
            format!("{}", bar.high),
            format!("{}", bar.low),
            format!("{}", bar.close),
            format!("{}", bar.volume),
        ])
        .map_err(|e| RuletraderError::Data {
            reason: format!("CSV write error: {e}"),
        })?;
    }
    wtr.flush().map_err(|e| RuletraderError::Data {
        reason: format!("CSV write error: {e}"),
    })?;
    Ok(())
}
