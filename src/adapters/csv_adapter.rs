//! CSV file data adapter.
//!
//! One file per ticker, `{ticker}.csv`, with a
//! `date,open,high,low,close,volume` header.

use crate::domain::error::RangeTraderError;
use crate::domain::ohlcv::{is_strictly_ascending, DailyBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvBarSource {
    base_path: PathBuf,
}

impl CsvBarSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }

    /// Tickers with a CSV file under the base path, sorted.
    pub fn available_tickers(&self) -> Result<Vec<String>, RangeTraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RangeTraderError::Database {
            reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RangeTraderError::Database {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                tickers.push(ticker.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, RangeTraderError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| RangeTraderError::Database {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| RangeTraderError::Database {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl DataPort for CsvBarSource {
    fn fetch_daily(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, RangeTraderError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| RangeTraderError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| RangeTraderError::Database {
                reason: format!("CSV parse error: {e}"),
            })?;

            let date_str = record.get(0).ok_or_else(|| RangeTraderError::Database {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                RangeTraderError::Database {
                    reason: format!("invalid date format: {e}"),
                }
            })?;

            if start_date.is_some_and(|start| date < start)
                || end_date.is_some_and(|end| date > end)
            {
                continue;
            }

            bars.push(DailyBar {
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        if !is_strictly_ascending(&bars) {
            return Err(RangeTraderError::Database {
                reason: format!("duplicate dates in {}", path.display()),
            });
        }
        Ok(bars)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RangeTraderError> {
        if !self.csv_path(ticker).exists() {
            return Ok(None);
        }
        let bars = self.fetch_daily(ticker, None, None)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
