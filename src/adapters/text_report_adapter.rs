//! Plain-text report adapter.
//!
//! Renders the ruled report blocks for backtest results and the current
//! trading signal, and writes them through the report port.

use crate::domain::engine::BacktestResult;
use crate::domain::error::RangeTraderError;
use crate::domain::scaled_strategy::ScaledResult;
use crate::domain::signal::Signal;
use crate::domain::snapshot::SignalSnapshot;
use crate::ports::report_port::ReportPort;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const RULE: &str =
    "================================================================================";
const THIN_RULE: &str =
    "--------------------------------------------------------------------------------";

#[derive(Debug, Default)]
pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn render_backtest(&self, result: &BacktestResult) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "BACKTEST RESULTS");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Strategy: {}", result.strategy_name);
        let _ = writeln!(out);
        let _ = writeln!(out, "Performance:");
        let _ = writeln!(
            out,
            "  Initial Capital:    ${:>12.2}",
            result.initial_capital
        );
        let _ = writeln!(out, "  Final Value:        ${:>12.2}", result.final_value);
        let _ = writeln!(
            out,
            "  Total Return:       ${:>12.2} ({:>+6.2}%)",
            result.total_return, result.total_return_pct
        );
        let _ = writeln!(
            out,
            "  Buy & Hold Return:                   ({:>+6.2}%)",
            result.buy_hold_return_pct
        );
        let _ = writeln!(
            out,
            "  Alpha (vs B&H):                      ({:>+6.2}%)",
            result.alpha
        );

        match &result.summary {
            Some(summary) => {
                let _ = writeln!(out);
                let _ = writeln!(out, "Trade Statistics:");
                let _ = writeln!(out, "  Total Trades:       {:>12}", summary.total_trades);
                let _ = writeln!(
                    out,
                    "  Winning Trades:     {:>12} ({:.1}%)",
                    summary.winning_trades, summary.win_rate
                );
                let _ = writeln!(out, "  Losing Trades:      {:>12}", summary.losing_trades);
                let _ = writeln!(out, "  Average P&L:        ${:>12.2}", summary.avg_pnl);
                let _ = writeln!(out, "  Average Win:        ${:>12.2}", summary.avg_win);
                let _ = writeln!(out, "  Average Loss:       ${:>12.2}", summary.avg_loss);
                let _ = writeln!(
                    out,
                    "  Avg Hold Period:    {:>12.1} days",
                    summary.avg_hold_days
                );
            }
            None => {
                let _ = writeln!(out);
                let _ = writeln!(out, "No completed trades.");
            }
        }
        let _ = writeln!(out, "{RULE}");
        out
    }

    pub fn render_scaled(&self, result: &ScaledResult) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "SCALED ENTRY/EXIT RESULTS ({})", result.plan);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Initial Capital:  ${:>12.2}", result.initial_capital);
        let _ = writeln!(out, "Final Value:      ${:>12.2}", result.final_value);
        let _ = writeln!(
            out,
            "Total Return:     ${:>12.2} ({:>+6.2}%)",
            result.total_return, result.total_return_pct
        );
        let _ = writeln!(
            out,
            "Buy & Hold:                        ({:>+6.2}%)",
            result.buy_hold_return_pct
        );
        let _ = writeln!(out, "Alpha:                             ({:>+6.2}%)", result.alpha);
        let _ = writeln!(out);
        let _ = writeln!(out, "Total Transactions: {}", result.trades.len());
        let _ = writeln!(out, "  Buys:  {}", result.buys);
        let _ = writeln!(out, "  Sells: {}", result.sells);
        let _ = writeln!(out, "{RULE}");
        out
    }

    pub fn render_snapshot(&self, snapshot: &SignalSnapshot) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "TRADING SIGNAL");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out);
        let _ = writeln!(out, "Date: {}", snapshot.date);
        let _ = writeln!(out, "Current Price: ${:.2}", snapshot.price);
        let _ = writeln!(out);
        let _ = writeln!(out, "SIGNAL: {} ({})", snapshot.signal, snapshot.strength);
        let _ = writeln!(out);
        let _ = writeln!(out, "SUPPORT & RESISTANCE LEVELS:");
        let _ = writeln!(out, "{THIN_RULE}");
        let _ = writeln!(
            out,
            "  Support (Time-Weighted):    ${:.2}",
            snapshot.support
        );
        let _ = writeln!(
            out,
            "  Resistance (Time-Weighted): ${:.2}",
            snapshot.resistance
        );
        if snapshot.support > 0.0 {
            let _ = writeln!(
                out,
                "  Trading Range Width:        ${:.2} ({:.1}%)",
                snapshot.range_width,
                snapshot.range_width / snapshot.support * 100.0
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "TRADING THRESHOLDS:");
        let _ = writeln!(out, "{THIN_RULE}");
        let _ = writeln!(out, "  BUY below:  ${:.2}", snapshot.buy_threshold);
        let _ = writeln!(out, "  SELL above: ${:.2}", snapshot.sell_threshold);
        let _ = writeln!(out);
        let _ = writeln!(out, "CURRENT POSITION:");
        let _ = writeln!(out, "{THIN_RULE}");
        match snapshot.position_in_range_pct {
            Some(pct) => {
                let _ = writeln!(out, "  Position in range: {pct:.1}%");
                let zone = if pct < 25.0 {
                    "NEAR SUPPORT - Buy zone"
                } else if pct > 75.0 {
                    "NEAR RESISTANCE - Sell zone"
                } else {
                    "MID RANGE - Wait for better entry"
                };
                let _ = writeln!(out, "  -> {zone}");
            }
            None => {
                let _ = writeln!(out, "  Position in range: n/a (degenerate range)");
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "RISK/REWARD ANALYSIS:");
        let _ = writeln!(out, "{THIN_RULE}");
        let _ = writeln!(
            out,
            "  Upside Potential:   ${:.2} ({:+.1}%)",
            snapshot.upside_potential, snapshot.upside_potential_pct
        );
        let _ = writeln!(
            out,
            "  Downside Risk:      ${:.2} ({:+.1}%)",
            snapshot.downside_risk, snapshot.downside_risk_pct
        );
        if snapshot.signal == Signal::Buy {
            let _ = writeln!(
                out,
                "  Risk/Reward Ratio:  {:.2}:1",
                snapshot.risk_reward_ratio
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "PEAK & TROUGH ANALYSIS:");
        let _ = writeln!(out, "{THIN_RULE}");
        let _ = writeln!(out, "  Recent Peaks (Resistance):");
        for (i, peak) in snapshot.peaks.iter().enumerate() {
            let days_ago = (snapshot.date - peak.date).num_days();
            let _ = writeln!(
                out,
                "    {}. ${:.2} ({} days ago, weight: {:.4})",
                i + 1,
                peak.price,
                days_ago,
                1.0 / (days_ago as f64 + 1.0)
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  Recent Troughs (Support):");
        for (i, trough) in snapshot.troughs.iter().enumerate() {
            let days_ago = (snapshot.date - trough.date).num_days();
            let _ = writeln!(
                out,
                "    {}. ${:.2} ({} days ago, weight: {:.4})",
                i + 1,
                trough.price,
                days_ago,
                1.0 / (days_ago as f64 + 1.0)
            );
        }
        let _ = writeln!(out, "{RULE}");
        out
    }

    fn write(&self, content: &str, output_path: &Path) -> Result<(), RangeTraderError> {
        fs::write(output_path, content)?;
        Ok(())
    }
}

impl ReportPort for TextReportAdapter {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<(), RangeTraderError> {
        self.write(&self.render_backtest(result), output_path)
    }

    fn write_scaled(
        &self,
        result: &ScaledResult,
        output_path: &Path,
    ) -> Result<(), RangeTraderError> {
        self.write(&self.render_scaled(result), output_path)
    }

    fn write_snapshot(
        &self,
        snapshot: &SignalSnapshot,
        output_path: &Path,
    ) -> Result<(), RangeTraderError> {
        self.write(&self.render_snapshot(snapshot), output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::PerformanceSummary;

    fn sample_result(summary: Option<PerformanceSummary>) -> BacktestResult {
        BacktestResult {
            strategy_name: "level_60".into(),
            initial_capital: 10_000.0,
            final_value: 12_500.0,
            total_return: 2_500.0,
            total_return_pct: 25.0,
            buy_hold_return_pct: 10.0,
            alpha: 15.0,
            trades: vec![],
            summary,
        }
    }

    #[test]
    fn backtest_report_includes_headline_numbers() {
        let adapter = TextReportAdapter;
        let summary = PerformanceSummary {
            total_trades: 4,
            winning_trades: 3,
            losing_trades: 1,
            win_rate: 75.0,
            total_pnl: 2_500.0,
            avg_pnl: 625.0,
            avg_win: 900.0,
            avg_loss: -200.0,
            avg_hold_days: 12.5,
            total_return_pct: 25.0,
        };

        let report = adapter.render_backtest(&sample_result(Some(summary)));
        assert!(report.contains("Strategy: level_60"));
        assert!(report.contains("(+25.00%)"));
        assert!(report.contains("Winning Trades:"));
        assert!(report.contains("(75.0%)"));
    }

    #[test]
    fn backtest_report_without_summary_says_so() {
        let adapter = TextReportAdapter;
        let report = adapter.render_backtest(&sample_result(None));
        assert!(report.contains("No completed trades."));
        assert!(!report.contains("Trade Statistics"));
    }

    #[test]
    fn write_backtest_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.txt");

        let adapter = TextReportAdapter;
        adapter
            .write_backtest(&sample_result(None), &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("BACKTEST RESULTS"));
    }
}
