#![allow(dead_code)]

use chrono::NaiveDate;
use rangetrader::domain::error::RangeTraderError;
pub use rangetrader::domain::ohlcv::DailyBar;
use rangetrader::domain::signal::Signal;
use rangetrader::domain::strategy::Strategy;
use rangetrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<DailyBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, RangeTraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(RangeTraderError::Database {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(ticker).cloned().unwrap_or_default();
        Ok(bars
            .into_iter()
            .filter(|b| {
                start_date.is_none_or(|start| b.date >= start)
                    && end_date.is_none_or(|end| b.date <= end)
            })
            .collect())
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RangeTraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(RangeTraderError::Database {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> DailyBar {
    DailyBar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000,
    }
}

/// Bars on consecutive calendar days starting at 2025-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<DailyBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            make_bar(
                date(2025, 1, 1) + chrono::Duration::days(i as i64),
                close,
            )
        })
        .collect()
}

/// A ranging series: `cycles` repetitions of peak/trough structure between
/// `low` and `high`, padded with the midpoint.
pub fn ranging_closes(len: usize, low: f64, high: f64) -> Vec<f64> {
    let mid = (low + high) / 2.0;
    let mut closes = vec![mid; len];
    let mut i = 5;
    let mut peak = true;
    while i < len.saturating_sub(1) {
        closes[i] = if peak { high } else { low };
        peak = !peak;
        i += 7;
    }
    closes
}

/// Replays a fixed per-index signal script; `Hold` past the end.
pub struct ScriptedStrategy {
    pub signals: Vec<Signal>,
}

impl ScriptedStrategy {
    pub fn new(signals: Vec<Signal>) -> Self {
        ScriptedStrategy { signals }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn signal(&mut self, history: &[DailyBar]) -> Signal {
        self.signals
            .get(history.len() - 1)
            .copied()
            .unwrap_or(Signal::Hold)
    }
}
