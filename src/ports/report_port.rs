//! Report generation port trait.

use crate::domain::engine::BacktestResult;
use crate::domain::error::RangeTraderError;
use crate::domain::scaled_strategy::ScaledResult;
use crate::domain::snapshot::SignalSnapshot;
use std::path::Path;

/// Port for writing human-readable reports out of simulation results.
pub trait ReportPort {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<(), RangeTraderError>;

    fn write_scaled(
        &self,
        result: &ScaledResult,
        output_path: &Path,
    ) -> Result<(), RangeTraderError>;

    fn write_snapshot(
        &self,
        snapshot: &SignalSnapshot,
        output_path: &Path,
    ) -> Result<(), RangeTraderError>;
}
