//! Time-weighted support and resistance estimation.
//!
//! Each extremum contributes weight `1 / (days_ago + 1)`: older points still
//! count but are dominated by fresher ones, so the levels adapt as the trading
//! range shifts.

use chrono::NaiveDate;

use super::extrema::{find_distributed_extrema, ExtremaParams, Extremum};
use super::ohlcv::DailyBar;

/// A support/resistance pair derived at one evaluation point.
///
/// `resistance >= support` is expected but not enforced; an inverted range is
/// a valid output signaling unreliable data, surfaced through
/// [`LevelEstimate::is_degenerate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelEstimate {
    pub support: f64,
    pub resistance: f64,
}

impl LevelEstimate {
    pub fn range_width(&self) -> f64 {
        self.resistance - self.support
    }

    pub fn is_degenerate(&self) -> bool {
        self.range_width() <= 0.0
    }

    /// Where `price` sits in the range: 0 at support, 100 at resistance,
    /// clamped to [0, 100]. `None` when the range is degenerate.
    pub fn position_in_range(&self, price: f64) -> Option<f64> {
        let width = self.range_width();
        if width <= 0.0 {
            return None;
        }
        Some((((price - self.support) / width) * 100.0).clamp(0.0, 100.0))
    }
}

/// Weighted-mean levels from non-empty peak and trough sets. `None` when
/// either set is empty (indeterminate level — never zero support/resistance).
pub fn estimate_levels(
    peaks: &[Extremum],
    troughs: &[Extremum],
    as_of: NaiveDate,
) -> Option<LevelEstimate> {
    let resistance = time_weighted_mean(peaks, as_of)?;
    let support = time_weighted_mean(troughs, as_of)?;
    Some(LevelEstimate {
        support,
        resistance,
    })
}

fn time_weighted_mean(points: &[Extremum], as_of: NaiveDate) -> Option<f64> {
    if points.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for point in points {
        let days_ago = (as_of - point.date).num_days();
        let weight = 1.0 / (days_ago as f64 + 1.0);
        weighted_sum += point.price * weight;
        weight_sum += weight;
    }

    // weight_sum > 0 because every weight is strictly positive.
    Some(weighted_sum / weight_sum)
}

/// Detect extrema over the trailing window and estimate levels as of the last
/// bar. The per-bar entry point used by the level-based strategies.
pub fn levels_from_bars(
    bars: &[DailyBar],
    lookback: usize,
    min_distance: usize,
) -> Option<(LevelEstimate, Vec<Extremum>, Vec<Extremum>)> {
    let last = bars.last()?;
    let params = ExtremaParams {
        lookback,
        min_distance,
        ..Default::default()
    };
    let (peaks, troughs) = find_distributed_extrema(bars, &params);
    let levels = estimate_levels(&peaks, &troughs, last.date)?;
    Some((levels, peaks, troughs))
}
