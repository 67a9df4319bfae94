//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Closing prices of a bar sequence, in sequence order.
pub fn closes(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// True when bars are strictly ascending by date (the ingestion contract:
/// ordered, no duplicate dates).
pub fn is_strictly_ascending(bars: &[DailyBar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date)
}
