//! Single-position execution engine.
//!
//! Replays a signal stream against closing prices, managing one long
//! position at a time: BUY opens while flat, SELL closes while long, and a
//! position surviving the last bar is force-closed at the final close.
//! Deterministic by construction — no clock, no randomness.

use chrono::NaiveDate;

use super::error::RangeTraderError;
use super::ohlcv::DailyBar;
use super::position::{Position, Trade, TradeAction};
use super::signal::Signal;
use super::strategy::{generate_signals, Strategy};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of available cash committed per entry, in (0, 1].
    pub position_size: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            position_size: 1.0,
        }
    }
}

/// Cash ledger, open position and trade ledger for one simulation run.
/// Concurrent runs must each use their own engine; no state is shared.
#[derive(Debug)]
pub struct ExecutionEngine {
    pub initial_capital: f64,
    pub cash: f64,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
}

impl ExecutionEngine {
    pub fn new(initial_capital: f64) -> Self {
        ExecutionEngine {
            initial_capital,
            cash: initial_capital,
            position: None,
            trades: Vec::new(),
        }
    }

    /// Apply one signal at one bar. BUY while long and SELL while flat are
    /// ignored, as is HOLD; that is the whole state machine.
    pub fn execute_signal(
        &mut self,
        date: NaiveDate,
        signal: Signal,
        price: f64,
        position_size: f64,
    ) {
        match signal {
            Signal::Buy if self.position.is_none() => self.enter(date, price, position_size),
            Signal::Sell if self.position.is_some() => self.exit(date, price, false),
            _ => {}
        }
    }

    fn enter(&mut self, date: NaiveDate, price: f64, position_size: f64) {
        let shares = (self.cash * position_size / price).floor() as i64;
        if shares < 1 {
            return;
        }

        let cost = shares as f64 * price;
        self.cash -= cost;
        self.position = Some(Position {
            entry_date: date,
            entry_price: price,
            shares,
        });
        self.trades.push(Trade {
            date,
            action: TradeAction::Buy,
            price,
            shares,
            value: cost,
            pnl: None,
            pnl_pct: None,
            hold_days: None,
            final_exit: false,
        });
    }

    fn exit(&mut self, date: NaiveDate, price: f64, final_exit: bool) {
        let Some(position) = self.position.take() else {
            return;
        };

        let proceeds = position.shares as f64 * price;
        self.cash += proceeds;
        self.trades.push(Trade {
            date,
            action: TradeAction::Sell,
            price,
            shares: position.shares,
            value: proceeds,
            pnl: Some(position.unrealized_pnl(price)),
            pnl_pct: Some(position.unrealized_pnl_pct(price)),
            hold_days: Some((date - position.entry_date).num_days()),
            final_exit,
        });
    }

    /// Close a surviving position at the end of the series. The trade is
    /// tagged `final_exit` but otherwise recorded identically.
    pub fn force_close(&mut self, date: NaiveDate, price: f64) {
        self.exit(date, price, true);
    }

    pub fn portfolio_value(&self, price: f64) -> f64 {
        match &self.position {
            Some(position) => self.cash + position.shares as f64 * price,
            None => self.cash,
        }
    }
}

/// Aggregate statistics over the closing trades of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_hold_days: f64,
    pub total_return_pct: f64,
}

impl PerformanceSummary {
    /// Errors with `NoCompletedTrades` unless at least one closing trade
    /// exists. `avg_win`/`avg_loss` are 0 when there are no winners/losers.
    pub fn compute(trades: &[Trade], initial_capital: f64) -> Result<Self, RangeTraderError> {
        let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closing()).collect();
        if closed.is_empty() {
            return Err(RangeTraderError::NoCompletedTrades);
        }

        let pnls: Vec<f64> = closed.iter().map(|t| t.pnl.unwrap_or(0.0)).collect();
        let total_pnl: f64 = pnls.iter().sum();
        let wins: Vec<f64> = pnls.iter().copied().filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|&p| p < 0.0).collect();
        let hold_days: i64 = closed.iter().map(|t| t.hold_days.unwrap_or(0)).sum();

        let count = closed.len() as f64;
        Ok(PerformanceSummary {
            total_trades: closed.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: wins.len() as f64 / count * 100.0,
            total_pnl,
            avg_pnl: total_pnl / count,
            avg_win: if wins.is_empty() {
                0.0
            } else {
                wins.iter().sum::<f64>() / wins.len() as f64
            },
            avg_loss: if losses.is_empty() {
                0.0
            } else {
                losses.iter().sum::<f64>() / losses.len() as f64
            },
            avg_hold_days: hold_days as f64 / count,
            total_return_pct: total_pnl / initial_capital * 100.0,
        })
    }
}

/// Full result of one single-position backtest.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub buy_hold_return_pct: f64,
    pub alpha: f64,
    pub trades: Vec<Trade>,
    /// `None` when no trade completed (surfaced as "no completed trades").
    pub summary: Option<PerformanceSummary>,
}

/// Run one strategy over a bar sequence.
///
/// Signals are generated causally, then replayed strictly in chronological
/// order. A surviving position is force-closed at the last close. The
/// buy-and-hold benchmark takes `floor(initial_capital / first_close)` shares
/// valued at the last close; alpha is the strategy return minus that.
pub fn run_backtest(
    strategy: &mut dyn Strategy,
    bars: &[DailyBar],
    config: &BacktestConfig,
) -> Result<BacktestResult, RangeTraderError> {
    if bars.is_empty() {
        return Err(RangeTraderError::EmptyInput);
    }

    let signals = generate_signals(strategy, bars);

    let mut engine = ExecutionEngine::new(config.initial_capital);
    for (bar, signal) in bars.iter().zip(&signals) {
        if *signal != Signal::Hold {
            engine.execute_signal(bar.date, *signal, bar.close, config.position_size);
        }
    }

    let last = &bars[bars.len() - 1];
    if engine.position.is_some() {
        engine.force_close(last.date, last.close);
    }

    let final_value = engine.portfolio_value(last.close);
    let total_return = final_value - config.initial_capital;
    let total_return_pct = total_return / config.initial_capital * 100.0;

    let buy_hold_shares = (config.initial_capital / bars[0].close).floor();
    let buy_hold_value = buy_hold_shares * last.close;
    let buy_hold_return_pct =
        (buy_hold_value - config.initial_capital) / config.initial_capital * 100.0;

    let summary = PerformanceSummary::compute(&engine.trades, config.initial_capital).ok();

    Ok(BacktestResult {
        strategy_name: strategy.name().to_string(),
        initial_capital: config.initial_capital,
        final_value,
        total_return,
        total_return_pct,
        buy_hold_return_pct,
        alpha: total_return_pct - buy_hold_return_pct,
        trades: engine.trades,
        summary,
    })
}

/// Backtest each strategy on a fresh engine and sort the results by return,
/// best first. Runs share nothing but the input bars.
pub fn compare_strategies(
    strategies: &mut [Box<dyn Strategy>],
    bars: &[DailyBar],
    config: &BacktestConfig,
) -> Result<Vec<BacktestResult>, RangeTraderError> {
    let mut results = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        results.push(run_backtest(strategy.as_mut(), bars, config)?);
    }
    results.sort_by(|a, b| b.total_return_pct.total_cmp(&a.total_return_pct));
    Ok(results)
}
