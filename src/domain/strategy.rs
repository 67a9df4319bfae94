//! Strategy contract and the level-based production strategy.
//!
//! Every strategy implements [`Strategy`]: one [`Signal`] per bar, computed
//! from history up to and including that bar and nothing beyond it. The
//! driver [`generate_signals`] enforces the causal evaluation order.

use super::levels::levels_from_bars;
use super::ohlcv::DailyBar;
use super::signal::Signal;

/// A causal signal source. `signal` is called once per bar in chronological
/// order with `&bars[..=i]`; internal mutable state may persist across calls
/// within one run and is cleared by `reset` between runs.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Bars to skip before the first evaluation; those bars emit `Hold`.
    fn warmup_bars(&self) -> usize;

    fn signal(&mut self, history: &[DailyBar]) -> Signal;

    fn reset(&mut self) {}
}

/// Evaluate a strategy over a bar sequence, one signal per bar.
///
/// Bars before the warmup emit `Hold`. The strategy only ever sees the
/// prefix ending at the bar under evaluation.
pub fn generate_signals(strategy: &mut dyn Strategy, bars: &[DailyBar]) -> Vec<Signal> {
    strategy.reset();
    let mut signals = vec![Signal::Hold; bars.len()];
    for i in strategy.warmup_bars()..bars.len() {
        signals[i] = strategy.signal(&bars[..=i]);
    }
    signals
}

/// Parameters for the time-weighted level strategy. Defaults are the
/// production settings.
#[derive(Debug, Clone)]
pub struct LevelParams {
    pub lookback: usize,
    pub min_distance: usize,
    pub buy_threshold_pct: f64,
    pub sell_threshold_pct: f64,
}

impl Default for LevelParams {
    fn default() -> Self {
        LevelParams {
            lookback: 60,
            min_distance: 5,
            buy_threshold_pct: 2.0,
            sell_threshold_pct: 2.0,
        }
    }
}

/// Buys near time-weighted support, sells near time-weighted resistance.
///
/// Levels are recomputed per bar over the history *before* the bar under
/// evaluation; the bar's own close is only compared against the thresholds.
/// The buy condition is checked before the sell condition; that order is part
/// of the contract.
#[derive(Debug, Clone)]
pub struct LevelStrategy {
    name: String,
    pub params: LevelParams,
}

impl LevelStrategy {
    pub fn new(params: LevelParams) -> Self {
        let name = format!("level_{}", params.lookback);
        LevelStrategy { name, params }
    }

    pub fn buy_threshold(&self, support: f64) -> f64 {
        support * (1.0 + self.params.buy_threshold_pct / 100.0)
    }

    pub fn sell_threshold(&self, resistance: f64) -> f64 {
        resistance * (1.0 - self.params.sell_threshold_pct / 100.0)
    }
}

impl Default for LevelStrategy {
    fn default() -> Self {
        LevelStrategy::new(LevelParams::default())
    }
}

impl Strategy for LevelStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.params.lookback
    }

    fn signal(&mut self, history: &[DailyBar]) -> Signal {
        let Some((current, past)) = history.split_last() else {
            return Signal::Hold;
        };

        let Some((levels, _, _)) =
            levels_from_bars(past, self.params.lookback, self.params.min_distance)
        else {
            return Signal::Hold;
        };

        // An inverted range means the thresholds are untrustworthy; skip the bar.
        if levels.is_degenerate() {
            return Signal::Hold;
        }

        if current.close <= self.buy_threshold(levels.support) {
            Signal::Buy
        } else if current.close >= self.sell_threshold(levels.resistance) {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
