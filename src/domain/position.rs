//! Position and trade ledger records.

use chrono::NaiveDate;
use std::fmt;

/// An open long position. Exists only while a single-position strategy holds
/// a trade; created on BUY execution, destroyed on SELL execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: i64,
}

impl Position {
    pub fn cost_basis(&self) -> f64 {
        self.entry_price * self.shares as f64
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.shares as f64
    }

    pub fn unrealized_pnl_pct(&self, price: f64) -> f64 {
        let cost = self.cost_basis();
        if cost > 0.0 {
            self.unrealized_pnl(price) / cost * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Immutable ledger record appended on every executed trade. Closing trades
/// carry realized pnl, pnl_pct and hold_days; `final_exit` marks a position
/// force-closed at the end of the series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: i64,
    pub value: f64,
    pub pnl: Option<f64>,
    pub pnl_pct: Option<f64>,
    pub hold_days: Option<i64>,
    pub final_exit: bool,
}

impl Trade {
    pub fn is_closing(&self) -> bool {
        self.pnl.is_some()
    }
}
