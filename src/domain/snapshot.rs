//! Read-only "current signal" query.
//!
//! The single integration point consumed by external notification and
//! reporting collaborators: latest levels, the strategy's current signal, a
//! strength classification and the risk/reward picture when a buy is active.

use chrono::NaiveDate;
use std::fmt;

use super::error::RangeTraderError;
use super::extrema::Extremum;
use super::levels::levels_from_bars;
use super::ohlcv::DailyBar;
use super::signal::Signal;
use super::strategy::LevelParams;

/// Strong when price is beyond the level itself, Moderate when merely inside
/// the threshold band, Neutral otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStrength {
    Strong,
    Moderate,
    Neutral,
}

impl fmt::Display for SignalStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStrength::Strong => write!(f, "STRONG"),
            SignalStrength::Moderate => write!(f, "MODERATE"),
            SignalStrength::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub signal: Signal,
    pub strength: SignalStrength,
    pub support: f64,
    pub resistance: f64,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub range_width: f64,
    /// `None` when the range is degenerate.
    pub position_in_range_pct: Option<f64>,
    pub upside_potential: f64,
    pub upside_potential_pct: f64,
    pub downside_risk: f64,
    pub downside_risk_pct: f64,
    /// Reward over risk to the levels; 0 unless a BUY is active, and 0 when
    /// the potential loss is not positive.
    pub risk_reward_ratio: f64,
    pub peaks: Vec<Extremum>,
    pub troughs: Vec<Extremum>,
    pub lookback: usize,
}

/// Evaluate the level strategy's signal on the latest bar, with full context.
///
/// Unlike the per-bar backtest path, the snapshot estimates levels over the
/// entire history including the latest bar — it answers "where do we stand
/// right now", not "what would the simulation have done".
pub fn current_signal(
    bars: &[DailyBar],
    params: &LevelParams,
) -> Result<SignalSnapshot, RangeTraderError> {
    if bars.len() < params.lookback {
        return Err(RangeTraderError::InsufficientData {
            bars: bars.len(),
            minimum: params.lookback,
        });
    }

    let Some((levels, peaks, troughs)) =
        levels_from_bars(bars, params.lookback, params.min_distance)
    else {
        return Err(RangeTraderError::InsufficientData {
            bars: bars.len(),
            minimum: params.lookback,
        });
    };

    let last = &bars[bars.len() - 1];
    let price = last.close;

    let buy_threshold = levels.support * (1.0 + params.buy_threshold_pct / 100.0);
    let sell_threshold = levels.resistance * (1.0 - params.sell_threshold_pct / 100.0);

    let (signal, strength) = if price <= buy_threshold {
        let strength = if price < levels.support {
            SignalStrength::Strong
        } else {
            SignalStrength::Moderate
        };
        (Signal::Buy, strength)
    } else if price >= sell_threshold {
        let strength = if price > levels.resistance {
            SignalStrength::Strong
        } else {
            SignalStrength::Moderate
        };
        (Signal::Sell, strength)
    } else {
        (Signal::Hold, SignalStrength::Neutral)
    };

    let risk_reward_ratio = if signal == Signal::Buy {
        let potential_profit = levels.resistance - price;
        let potential_loss = price - levels.support;
        if potential_loss > 0.0 {
            potential_profit / potential_loss
        } else {
            0.0
        }
    } else {
        0.0
    };

    Ok(SignalSnapshot {
        date: last.date,
        price,
        signal,
        strength,
        support: levels.support,
        resistance: levels.resistance,
        buy_threshold,
        sell_threshold,
        range_width: levels.range_width(),
        position_in_range_pct: levels.position_in_range(price),
        upside_potential: levels.resistance - price,
        upside_potential_pct: (levels.resistance / price - 1.0) * 100.0,
        downside_risk: price - levels.support,
        downside_risk_pct: (price / levels.support - 1.0) * 100.0,
        risk_reward_ratio,
        peaks,
        troughs,
        lookback: params.lookback,
    })
}
