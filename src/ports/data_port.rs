//! Data access port trait.

use crate::domain::error::RangeTraderError;
use crate::domain::ohlcv::DailyBar;
use chrono::NaiveDate;

/// Supplies ordered daily bars for one ticker. Implementations must return
/// bars ascending by date with no duplicates.
pub trait DataPort {
    fn fetch_daily(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, RangeTraderError>;

    /// First date, last date and bar count for a ticker; `None` when the
    /// ticker has no data.
    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RangeTraderError>;
}
