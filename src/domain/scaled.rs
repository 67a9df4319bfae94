//! Scaled position tracking with partial buys and sells.
//!
//! Generalizes single-shot entry/exit into tranche accounting: each partial
//! buy adds to a weighted cost basis, each partial sell removes cost
//! proportionally so `position_cost / position_shares` stays a valid running
//! average for the remaining shares.

use chrono::NaiveDate;

use super::position::TradeAction;

/// Ledger record for one partial fill. `fraction` is the fraction of cash
/// (buys) or of the position (sells) that was requested; `total_shares` and
/// `cash_after` capture the tracker state after the fill.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledTrade {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: i64,
    pub value: f64,
    pub fraction: f64,
    pub pnl: Option<f64>,
    pub pnl_pct: Option<f64>,
    pub total_shares: i64,
    pub cash_after: f64,
}

/// Cash, shares and aggregate cost basis for one scaled simulation run.
///
/// Callers are expected to keep the fractions they pass within [0, 1]; the
/// tracker itself only guards against empty fills.
#[derive(Debug)]
pub struct ScaledTracker {
    pub initial_capital: f64,
    pub cash: f64,
    pub position_shares: i64,
    pub position_cost: f64,
    pub trades: Vec<ScaledTrade>,
}

impl ScaledTracker {
    pub fn new(initial_capital: f64) -> Self {
        ScaledTracker {
            initial_capital,
            cash: initial_capital,
            position_shares: 0,
            position_cost: 0.0,
            trades: Vec::new(),
        }
    }

    /// Buy whole shares with `fraction_of_cash` of the available cash.
    /// Returns the shares bought; 0 (no-op) when cash is exhausted or the
    /// fraction affords less than one share.
    pub fn buy(&mut self, date: NaiveDate, price: f64, fraction_of_cash: f64) -> i64 {
        if self.cash <= 0.0 {
            return 0;
        }

        let shares = (self.cash * fraction_of_cash / price).floor() as i64;
        if shares < 1 {
            return 0;
        }

        let cost = shares as f64 * price;
        self.cash -= cost;
        self.position_shares += shares;
        self.position_cost += cost;

        self.trades.push(ScaledTrade {
            date,
            action: TradeAction::Buy,
            price,
            shares,
            value: cost,
            fraction: fraction_of_cash,
            pnl: None,
            pnl_pct: None,
            total_shares: self.position_shares,
            cash_after: self.cash,
        });

        shares
    }

    /// Sell whole shares amounting to `fraction_of_position` of the current
    /// position, realizing pnl against the running average cost. Returns the
    /// shares sold; 0 (no-op) when flat or the fraction rounds below one
    /// share.
    pub fn sell(&mut self, date: NaiveDate, price: f64, fraction_of_position: f64) -> i64 {
        if self.position_shares <= 0 {
            return 0;
        }

        let shares = (self.position_shares as f64 * fraction_of_position).floor() as i64;
        if shares < 1 {
            return 0;
        }

        let proceeds = shares as f64 * price;
        let avg_cost = self.position_cost / self.position_shares as f64;
        let cost_of_shares_sold = shares as f64 * avg_cost;
        let pnl = proceeds - cost_of_shares_sold;
        let pnl_pct = if cost_of_shares_sold > 0.0 {
            pnl / cost_of_shares_sold * 100.0
        } else {
            0.0
        };

        self.cash += proceeds;
        self.position_shares -= shares;
        self.position_cost -= cost_of_shares_sold;
        if self.position_shares == 0 {
            // Clear float residue so cost is exactly 0 when flat.
            self.position_cost = 0.0;
        }

        self.trades.push(ScaledTrade {
            date,
            action: TradeAction::Sell,
            price,
            shares,
            value: proceeds,
            fraction: fraction_of_position,
            pnl: Some(pnl),
            pnl_pct: Some(pnl_pct),
            total_shares: self.position_shares,
            cash_after: self.cash,
        });

        shares
    }

    pub fn portfolio_value(&self, current_price: f64) -> f64 {
        self.cash + self.position_shares as f64 * current_price
    }

    /// Current position cost as a percentage of initial capital.
    pub fn position_pct(&self) -> f64 {
        if self.position_shares == 0 {
            return 0.0;
        }
        self.position_cost / self.initial_capital * 100.0
    }

    /// Running average cost per held share; `None` when flat.
    pub fn average_cost(&self) -> Option<f64> {
        if self.position_shares > 0 {
            Some(self.position_cost / self.position_shares as f64)
        } else {
            None
        }
    }
}
