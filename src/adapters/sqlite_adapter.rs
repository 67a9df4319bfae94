//! SQLite data adapter.
//!
//! Stores one row per (ticker, date) in a `daily_prices` table, the local
//! mirror of whatever upstream feed seeded it.

use crate::domain::error::RangeTraderError;
use crate::domain::ohlcv::DailyBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteBarSource {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteBarSource {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RangeTraderError> {
        let db_path =
            config
                .get_string("data", "path")
                .ok_or_else(|| RangeTraderError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("data", "pool_size", 2) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| RangeTraderError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, RangeTraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| RangeTraderError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), RangeTraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| RangeTraderError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_prices (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (ticker, date)
            );
            CREATE INDEX IF NOT EXISTS idx_daily_prices_ticker ON daily_prices(ticker);",
        )
        .map_err(|e: rusqlite::Error| RangeTraderError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Upsert a batch of bars for one ticker inside a single transaction.
    pub fn insert_bars(&self, ticker: &str, bars: &[DailyBar]) -> Result<(), RangeTraderError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| RangeTraderError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| RangeTraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO daily_prices
                    (ticker, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    ticker,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(|e: rusqlite::Error| RangeTraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| RangeTraderError::DatabaseQuery {
                reason: e.to_string(),
            })
    }
}

fn parse_row_date(raw: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

impl DataPort for SqliteBarSource {
    fn fetch_daily(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, RangeTraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| RangeTraderError::Database {
                reason: e.to_string(),
            })?;

        let start = start_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "0000-00-00".to_string());
        let end = end_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "9999-99-99".to_string());

        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM daily_prices
                 WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(|e: rusqlite::Error| RangeTraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![ticker, start, end], |row| {
                let date_str: String = row.get(0)?;
                Ok(DailyBar {
                    date: parse_row_date(&date_str)?,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            })
            .map_err(|e: rusqlite::Error| RangeTraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(|e| RangeTraderError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }
        Ok(bars)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RangeTraderError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| RangeTraderError::Database {
                reason: e.to_string(),
            })?;

        let result = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*)
                 FROM daily_prices WHERE ticker = ?1",
                params![ticker],
                |row| {
                    let min: Option<String> = row.get(0)?;
                    let max: Option<String> = row.get(1)?;
                    let count: i64 = row.get(2)?;
                    Ok((min, max, count))
                },
            )
            .map_err(|e: rusqlite::Error| RangeTraderError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min), Some(max), count) if count > 0 => {
                let first = parse_row_date(&min).map_err(|e| RangeTraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
                let last = parse_row_date(&max).map_err(|e| RangeTraderError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
                Ok(Some((first, last, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 10_000,
        }
    }

    fn seeded() -> SqliteBarSource {
        let source = SqliteBarSource::in_memory().unwrap();
        source.initialize_schema().unwrap();
        source
            .insert_bars(
                "YINN",
                &[
                    bar("2025-01-15", 50.0),
                    bar("2025-01-16", 51.0),
                    bar("2025-01-17", 49.5),
                ],
            )
            .unwrap();
        source
    }

    #[test]
    fn fetch_round_trip() {
        let source = seeded();
        let bars = source.fetch_daily("YINN", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(bars[0].close, 50.0);
        assert_eq!(bars[2].close, 49.5);
    }

    #[test]
    fn fetch_filters_by_date() {
        let source = seeded();
        let bars = source
            .fetch_daily(
                "YINN",
                Some(NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()),
                None,
            )
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 51.0);
    }

    #[test]
    fn unknown_ticker_is_empty() {
        let source = seeded();
        let bars = source.fetch_daily("SPY", None, None).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let source = seeded();
        source
            .insert_bars("YINN", &[bar("2025-01-16", 60.0)])
            .unwrap();

        let bars = source.fetch_daily("YINN", None, None).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].close, 60.0);
    }

    #[test]
    fn data_range_bounds() {
        let source = seeded();
        let (first, last, count) = source.data_range("YINN").unwrap().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 1, 17).unwrap());
        assert_eq!(count, 3);

        assert!(source.data_range("SPY").unwrap().is_none());
    }
}
