//! Distributed peak and trough detection.
//!
//! Finds the top `num_peaks` peaks and bottom `num_troughs` troughs over a
//! lookback window, ensuring they are well-distributed rather than clustered:
//!
//! 1. Raw pass: strict local maxima, filtered by a minimum prominence and a
//!    minimum index separation (the higher of two close candidates survives).
//!    Troughs are maxima of the negated series.
//! 2. Rank peaks by price descending, troughs ascending.
//! 3. Greedy distribution filter at `min_distance`.
//! 4. Re-sort the accepted points chronologically.

use chrono::NaiveDate;

use super::ohlcv::{closes, DailyBar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Peak,
    Trough,
}

/// A local maximum or minimum within an analysis window. `index` is the
/// position within that window, not the full series.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremum {
    pub date: NaiveDate,
    pub price: f64,
    pub index: usize,
    pub kind: ExtremumKind,
}

#[derive(Debug, Clone)]
pub struct ExtremaParams {
    pub lookback: usize,
    pub min_distance: usize,
    pub num_peaks: usize,
    pub num_troughs: usize,
    pub prominence: f64,
}

impl Default for ExtremaParams {
    fn default() -> Self {
        ExtremaParams {
            lookback: 60,
            min_distance: 5,
            num_peaks: 3,
            num_troughs: 3,
            prominence: 0.5,
        }
    }
}

/// Find distributed peaks and troughs in the trailing `lookback` bars.
///
/// Shorter windows than `lookback` use the full available window. Fewer raw
/// extrema than requested returns all found, possibly empty — callers must
/// treat empty outputs as "indeterminate level", never as zero.
pub fn find_distributed_extrema(
    bars: &[DailyBar],
    params: &ExtremaParams,
) -> (Vec<Extremum>, Vec<Extremum>) {
    let lookback = params.lookback.min(bars.len());
    let window = &bars[bars.len() - lookback..];
    let prices = closes(window);
    let negated: Vec<f64> = prices.iter().map(|p| -p).collect();

    let peak_indices = raw_local_maxima(&prices, params.min_distance, params.prominence);
    let trough_indices = raw_local_maxima(&negated, params.min_distance, params.prominence);

    let mut peaks: Vec<Extremum> = peak_indices
        .iter()
        .map(|&i| Extremum {
            date: window[i].date,
            price: prices[i],
            index: i,
            kind: ExtremumKind::Peak,
        })
        .collect();

    let mut troughs: Vec<Extremum> = trough_indices
        .iter()
        .map(|&i| Extremum {
            date: window[i].date,
            price: prices[i],
            index: i,
            kind: ExtremumKind::Trough,
        })
        .collect();

    // Highest peaks first, lowest troughs first.
    peaks.sort_by(|a, b| b.price.total_cmp(&a.price));
    troughs.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut peaks = filter_distributed(peaks, params.min_distance, params.num_peaks);
    let mut troughs = filter_distributed(troughs, params.min_distance, params.num_troughs);

    peaks.sort_by_key(|p| p.date);
    troughs.sort_by_key(|t| t.date);

    (peaks, troughs)
}

/// Raw local-maxima pass: strict interior maxima, pruned by prominence, then
/// by minimum index distance with higher candidates taking priority.
fn raw_local_maxima(prices: &[f64], min_distance: usize, min_prominence: f64) -> Vec<usize> {
    let mut candidates: Vec<usize> = Vec::new();
    for i in 1..prices.len().saturating_sub(1) {
        if prices[i] > prices[i - 1] && prices[i] > prices[i + 1] {
            candidates.push(i);
        }
    }

    candidates.retain(|&i| prominence(prices, i) >= min_prominence);

    if candidates.len() <= 1 {
        return candidates;
    }

    // Process candidates from highest to lowest; each accepted maximum
    // suppresses any lower candidate closer than min_distance.
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| prices[candidates[b]].total_cmp(&prices[candidates[a]]));

    let mut suppressed = vec![false; candidates.len()];
    for &rank in &order {
        if suppressed[rank] {
            continue;
        }
        let idx = candidates[rank];
        for (other_rank, &other) in candidates.iter().enumerate() {
            if other_rank != rank && idx.abs_diff(other) < min_distance {
                suppressed[other_rank] = true;
            }
        }
    }

    candidates
        .iter()
        .enumerate()
        .filter(|(rank, _)| !suppressed[*rank])
        .map(|(_, &idx)| idx)
        .collect()
}

/// Prominence of the maximum at `peak`: its height above the higher of the two
/// deepest valleys separating it from the nearest higher ground on each side.
/// Window edges act as boundaries.
fn prominence(prices: &[f64], peak: usize) -> f64 {
    let height = prices[peak];

    let mut left_base = height;
    for i in (0..peak).rev() {
        if prices[i] > height {
            break;
        }
        if prices[i] < left_base {
            left_base = prices[i];
        }
    }

    let mut right_base = height;
    for &price in &prices[peak + 1..] {
        if price > height {
            break;
        }
        if price < right_base {
            right_base = price;
        }
    }

    height - left_base.max(right_base)
}

/// Greedy distribution filter: walk the ranked candidates, accepting a point
/// only if it sits at least `min_distance` indices from every accepted point,
/// until `num_points` are accepted. Candidate lists no longer than the request
/// pass through unfiltered.
fn filter_distributed(points: Vec<Extremum>, min_distance: usize, num_points: usize) -> Vec<Extremum> {
    if points.len() <= num_points {
        return points;
    }

    let mut selected: Vec<Extremum> = Vec::with_capacity(num_points);
    for point in points {
        let far_enough = selected
            .iter()
            .all(|s| point.index.abs_diff(s.index) >= min_distance);
        if far_enough {
            selected.push(point);
        }
        if selected.len() >= num_points {
            break;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars_from_closes(values: &[f64]) -> Vec<DailyBar> {
        values
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn finds_hand_placed_peaks_and_troughs() {
        // Peaks at indices 5 and 15, troughs at 10 and 20.
        let mut closes = vec![50.0; 25];
        closes[5] = 60.0;
        closes[10] = 40.0;
        closes[15] = 58.0;
        closes[20] = 42.0;
        let bars = bars_from_closes(&closes);

        let params = ExtremaParams {
            lookback: 25,
            min_distance: 3,
            ..Default::default()
        };
        let (peaks, troughs) = find_distributed_extrema(&bars, &params);

        assert_eq!(
            peaks.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![5, 15]
        );
        assert_eq!(
            troughs.iter().map(|t| t.index).collect::<Vec<_>>(),
            vec![10, 20]
        );
        assert!(peaks.iter().all(|p| p.kind == ExtremumKind::Peak));
        assert!(troughs.iter().all(|t| t.kind == ExtremumKind::Trough));
    }

    #[test]
    fn close_peaks_keep_only_the_higher() {
        // Two peaks 2 indices apart with min_distance 5: the raw pass must
        // retain only the higher one.
        let mut closes = vec![50.0; 20];
        closes[8] = 60.0;
        closes[9] = 49.0;
        closes[10] = 58.0;
        let bars = bars_from_closes(&closes);

        let params = ExtremaParams {
            lookback: 20,
            min_distance: 5,
            ..Default::default()
        };
        let (peaks, _) = find_distributed_extrema(&bars, &params);

        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 8);
        assert_eq!(peaks[0].price, 60.0);
    }

    #[test]
    fn accepted_points_respect_min_distance() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 50.0 + 8.0 * ((i as f64) * 0.9).sin())
            .collect();
        let bars = bars_from_closes(&closes);

        let params = ExtremaParams {
            lookback: 60,
            min_distance: 5,
            num_peaks: 5,
            num_troughs: 5,
            ..Default::default()
        };
        let (peaks, troughs) = find_distributed_extrema(&bars, &params);

        for set in [&peaks, &troughs] {
            for a in set.iter() {
                for b in set.iter() {
                    if a.index != b.index {
                        assert!(a.index.abs_diff(b.index) >= 5);
                    }
                }
            }
        }
    }

    #[test]
    fn low_prominence_noise_is_suppressed() {
        // A 0.3 bump is below the default 0.5 prominence threshold.
        let mut closes = vec![50.0; 15];
        closes[7] = 50.3;
        let bars = bars_from_closes(&closes);

        let (peaks, _) = find_distributed_extrema(&bars, &ExtremaParams::default());
        assert!(peaks.is_empty());
    }

    #[test]
    fn short_window_uses_all_bars() {
        let mut closes = vec![50.0; 10];
        closes[4] = 55.0;
        let bars = bars_from_closes(&closes);

        let params = ExtremaParams {
            lookback: 100,
            min_distance: 2,
            ..Default::default()
        };
        let (peaks, _) = find_distributed_extrema(&bars, &params);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 4);
    }

    #[test]
    fn flat_series_has_no_extrema() {
        let bars = bars_from_closes(&[50.0; 30]);
        let (peaks, troughs) = find_distributed_extrema(&bars, &ExtremaParams::default());
        assert!(peaks.is_empty());
        assert!(troughs.is_empty());
    }

    #[test]
    fn results_are_chronological() {
        // Ranking visits the highest peak (index 20) first; output must still
        // be date-ordered.
        let mut closes = vec![50.0; 30];
        closes[5] = 57.0;
        closes[12] = 55.0;
        closes[20] = 62.0;
        let bars = bars_from_closes(&closes);

        let params = ExtremaParams {
            lookback: 30,
            min_distance: 3,
            ..Default::default()
        };
        let (peaks, _) = find_distributed_extrema(&bars, &params);
        assert_eq!(
            peaks.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![5, 12, 20]
        );
    }

    #[test]
    fn distribution_filter_prefers_extreme_prices() {
        // Five raw peaks, request two: the two highest that are far enough
        // apart win.
        let mut closes = vec![50.0; 40];
        closes[5] = 56.0;
        closes[12] = 61.0;
        closes[14] = 60.0; // suppressed by the higher peak at index 12
        closes[25] = 59.0;
        closes[33] = 54.0;
        let bars = bars_from_closes(&closes);

        let params = ExtremaParams {
            lookback: 40,
            min_distance: 5,
            num_peaks: 2,
            ..Default::default()
        };
        let (peaks, _) = find_distributed_extrema(&bars, &params);

        assert_eq!(
            peaks.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![12, 25]
        );
    }

    #[test]
    fn window_too_small_for_interior_points() {
        let bars = bars_from_closes(&[50.0, 60.0]);
        let (peaks, troughs) = find_distributed_extrema(&bars, &ExtremaParams::default());
        assert!(peaks.is_empty());
        assert!(troughs.is_empty());
    }

    #[test]
    fn fewer_candidates_than_requested_returns_all() {
        let mut closes = vec![50.0; 30];
        closes[10] = 58.0;
        let bars = bars_from_closes(&closes);

        let params = ExtremaParams {
            lookback: 30,
            min_distance: 5,
            num_peaks: 3,
            ..Default::default()
        };
        let (peaks, _) = find_distributed_extrema(&bars, &params);
        assert_eq!(peaks.len(), 1);
    }
}
