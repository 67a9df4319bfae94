//! Tranche strategies driving the scaled position tracker.
//!
//! Two plans over the same time-weighted levels:
//!
//! - [`run_scaled_backtest`]: scale in 30/30/40 as price falls through the
//!   range toward support, scale out 30/30/40 as it rises toward resistance.
//! - [`run_support_bounce_backtest`]: concentrate fills in the support zone —
//!   half at support, a quarter on a break below, the rest on a confirmed
//!   bounce off the tracked low.
//!
//! Each tranche is guarded by a named flag that fires at most once per
//! position cycle; all flags reset when the position returns to flat. The
//! listed condition order is the priority order and must be preserved.

use super::error::RangeTraderError;
use super::levels::levels_from_bars;
use super::ohlcv::DailyBar;
use super::position::TradeAction;
use super::scaled::{ScaledTracker, ScaledTrade};

#[derive(Debug, Clone)]
pub struct ScaledConfig {
    pub initial_capital: f64,
    pub lookback: usize,
    pub min_distance: usize,
}

impl Default for ScaledConfig {
    fn default() -> Self {
        ScaledConfig {
            initial_capital: 10_000.0,
            lookback: 60,
            min_distance: 5,
        }
    }
}

/// One tranche level per field, in priority order. A flag is set when its
/// condition first triggers and stays set until the cycle ends.
#[derive(Debug, Clone, Copy, Default)]
struct TrancheFlags {
    approach: bool,
    near: bool,
    touch: bool,
}

impl TrancheFlags {
    fn reset(&mut self) {
        *self = TrancheFlags::default();
    }
}

/// Result of a scaled (multi-tranche) simulation run.
#[derive(Debug, Clone)]
pub struct ScaledResult {
    pub plan: String,
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub buy_hold_return_pct: f64,
    pub alpha: f64,
    pub buys: usize,
    pub sells: usize,
    pub trades: Vec<ScaledTrade>,
}

fn finish(
    plan: &str,
    tracker: ScaledTracker,
    bars: &[DailyBar],
    config: &ScaledConfig,
) -> ScaledResult {
    let final_price = bars[bars.len() - 1].close;
    let final_value = tracker.portfolio_value(final_price);
    let total_return = final_value - config.initial_capital;
    let total_return_pct = total_return / config.initial_capital * 100.0;

    // Benchmark buys and holds from the first tradable bar.
    let first_price = bars[config.lookback].close;
    let buy_hold_shares = (config.initial_capital / first_price).floor();
    let buy_hold_value = buy_hold_shares * final_price;
    let buy_hold_return_pct =
        (buy_hold_value - config.initial_capital) / config.initial_capital * 100.0;

    let buys = tracker
        .trades
        .iter()
        .filter(|t| t.action == TradeAction::Buy)
        .count();
    let sells = tracker.trades.len() - buys;

    ScaledResult {
        plan: plan.to_string(),
        initial_capital: config.initial_capital,
        final_value,
        total_return,
        total_return_pct,
        buy_hold_return_pct,
        alpha: total_return_pct - buy_hold_return_pct,
        buys,
        sells,
        trades: tracker.trades,
    }
}

fn check_input(bars: &[DailyBar], config: &ScaledConfig) -> Result<(), RangeTraderError> {
    if bars.is_empty() {
        return Err(RangeTraderError::EmptyInput);
    }
    if bars.len() <= config.lookback {
        return Err(RangeTraderError::InsufficientData {
            bars: bars.len(),
            minimum: config.lookback + 1,
        });
    }
    Ok(())
}

/// Scale in/out by position in the range.
///
/// BUY tranches: 30% of cash at ≤20% in range, 30% at ≤10%, all remaining
/// cash at ≤2%. SELL tranches: 30% of the position at ≥80%, 30% at ≥90%, all
/// remaining at ≥98%. Bars with indeterminate levels or a degenerate range
/// are skipped.
pub fn run_scaled_backtest(
    bars: &[DailyBar],
    config: &ScaledConfig,
) -> Result<ScaledResult, RangeTraderError> {
    check_input(bars, config)?;

    let mut tracker = ScaledTracker::new(config.initial_capital);
    let mut buy_levels = TrancheFlags::default();
    let mut sell_levels = TrancheFlags::default();

    for i in config.lookback..bars.len() {
        let history = &bars[..i];
        let Some((levels, _, _)) =
            levels_from_bars(history, config.lookback, config.min_distance)
        else {
            continue;
        };

        let bar = &bars[i];
        let Some(position_pct) = levels.position_in_range(bar.close) else {
            continue;
        };

        if tracker.position_shares == 0 {
            buy_levels.reset();
            sell_levels.reset();
        }

        if position_pct <= 20.0 && !buy_levels.approach {
            tracker.buy(bar.date, bar.close, 0.30);
            buy_levels.approach = true;
        } else if position_pct <= 10.0 && !buy_levels.near {
            tracker.buy(bar.date, bar.close, 0.30);
            buy_levels.near = true;
        } else if position_pct <= 2.0 && !buy_levels.touch {
            tracker.buy(bar.date, bar.close, 1.0);
            buy_levels.touch = true;
        }

        if tracker.position_shares > 0 {
            if position_pct >= 80.0 && !sell_levels.approach {
                tracker.sell(bar.date, bar.close, 0.30);
                sell_levels.approach = true;
            } else if position_pct >= 90.0 && !sell_levels.near {
                tracker.sell(bar.date, bar.close, 0.30);
                sell_levels.near = true;
            } else if position_pct >= 98.0 && !sell_levels.touch {
                tracker.sell(bar.date, bar.close, 1.0);
                sell_levels.touch = true;
            }
        }
    }

    Ok(finish("scaled_30_30_40", tracker, bars, config))
}

/// Buy-side flags for the support-zone plan: `main` at support, `below` on a
/// break under it, `bounce` on the confirmation leg.
#[derive(Debug, Clone, Copy, Default)]
struct BounceFlags {
    main: bool,
    below: bool,
    bounce: bool,
}

impl BounceFlags {
    fn reset(&mut self) {
        *self = BounceFlags::default();
    }
}

/// Sell-side flags for the support-zone plan.
#[derive(Debug, Clone, Copy, Default)]
struct ResistanceFlags {
    main: bool,
    partial: bool,
    above: bool,
}

impl ResistanceFlags {
    fn reset(&mut self) {
        *self = ResistanceFlags::default();
    }
}

/// Concentrate fills in the support zone.
///
/// BUY: 50% of cash within 2% of support (`main`), 50% of remaining cash 3%
/// below support (`below`), all remaining cash once price bounces 2% off the
/// tracked low after a main fill (`bounce`). SELL: 50% of the position within
/// 2% of resistance, 30% approaching it (≥90%, below the 98% zone), all
/// remaining 3% above it.
pub fn run_support_bounce_backtest(
    bars: &[DailyBar],
    config: &ScaledConfig,
) -> Result<ScaledResult, RangeTraderError> {
    check_input(bars, config)?;

    let mut tracker = ScaledTracker::new(config.initial_capital);
    let mut buy_levels = BounceFlags::default();
    let mut sell_levels = ResistanceFlags::default();
    let mut lowest_price: Option<f64> = None;

    for i in config.lookback..bars.len() {
        let history = &bars[..i];
        let Some((levels, _, _)) =
            levels_from_bars(history, config.lookback, config.min_distance)
        else {
            continue;
        };
        if levels.is_degenerate() {
            continue;
        }

        let bar = &bars[i];
        let price = bar.close;

        if tracker.position_shares == 0 {
            lowest_price = None;
            buy_levels.reset();
            sell_levels.reset();
        } else if lowest_price.is_none_or(|low| price < low) {
            lowest_price = Some(price);
        }

        if price <= levels.support * 1.02 && !buy_levels.main {
            tracker.buy(bar.date, price, 0.50);
            buy_levels.main = true;
            lowest_price = Some(price);
        } else if price < levels.support * 0.97 && !buy_levels.below {
            tracker.buy(bar.date, price, 0.50);
            buy_levels.below = true;
        } else if let Some(low) = lowest_price {
            // Bounce confirmation only counts after the main fill.
            if price > low * 1.02 && buy_levels.main && !buy_levels.bounce {
                tracker.buy(bar.date, price, 1.0);
                buy_levels.bounce = true;
            }
        }

        if tracker.position_shares > 0 {
            if price >= levels.resistance * 0.98 && !sell_levels.main {
                tracker.sell(bar.date, price, 0.50);
                sell_levels.main = true;
            } else if price >= levels.resistance * 0.90
                && price < levels.resistance * 0.98
                && !sell_levels.partial
            {
                tracker.sell(bar.date, price, 0.30);
                sell_levels.partial = true;
            } else if price > levels.resistance * 1.03 && !sell_levels.above {
                tracker.sell(bar.date, price, 1.0);
                sell_levels.above = true;
            }
        }
    }

    Ok(finish("support_bounce", tracker, bars, config))
}
