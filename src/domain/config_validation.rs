//! Configuration validation.
//!
//! Validates all config fields before a run starts, so a bad file fails with
//! a config error instead of a mid-run surprise.

use chrono::NaiveDate;

use super::error::RangeTraderError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TICKER: &str = "YINN";
pub const DEFAULT_LOOKBACK: i64 = 60;
pub const DEFAULT_MIN_DISTANCE: i64 = 5;
pub const DEFAULT_BUY_THRESHOLD_PCT: f64 = 2.0;
pub const DEFAULT_SELL_THRESHOLD_PCT: f64 = 2.0;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_POSITION_SIZE: f64 = 1.0;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "sqlite".to_string());

    match source.as_str() {
        "sqlite" | "csv" => {}
        _ => {
            return Err(RangeTraderError::ConfigInvalid {
                section: "data".to_string(),
                key: "source".to_string(),
                reason: format!("unknown source '{source}', expected sqlite or csv"),
            });
        }
    }

    if config.get_string("data", "path").is_none() {
        return Err(RangeTraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        });
    }

    if let Some(ticker) = config.get_string("data", "ticker") {
        if ticker.trim().is_empty() {
            return Err(RangeTraderError::ConfigInvalid {
                section: "data".to_string(),
                key: "ticker".to_string(),
                reason: "ticker must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    validate_initial_capital(config)?;
    validate_position_size(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    validate_lookback(config)?;
    validate_min_distance(config)?;
    validate_thresholds(config)?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if value <= 0.0 {
        return Err(RangeTraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    let value = config.get_double("backtest", "position_size", DEFAULT_POSITION_SIZE);
    if value <= 0.0 || value > 1.0 {
        return Err(RangeTraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "position_size".to_string(),
            reason: "position_size must be in (0, 1]".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(RangeTraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must be before end_date".to_string(),
            });
        }
    }
    Ok(())
}

/// Dates are optional; when present they must parse as YYYY-MM-DD.
fn parse_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, RangeTraderError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| RangeTraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("'{raw}' is not a YYYY-MM-DD date"),
            }),
    }
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    let value = config.get_int("strategy", "lookback", DEFAULT_LOOKBACK);
    if value < 2 {
        return Err(RangeTraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "lookback".to_string(),
            reason: "lookback must be at least 2".to_string(),
        });
    }
    Ok(())
}

fn validate_min_distance(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    let min_distance = config.get_int("strategy", "min_distance", DEFAULT_MIN_DISTANCE);
    if min_distance < 1 {
        return Err(RangeTraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "min_distance".to_string(),
            reason: "min_distance must be at least 1".to_string(),
        });
    }

    let lookback = config.get_int("strategy", "lookback", DEFAULT_LOOKBACK);
    if min_distance >= lookback {
        return Err(RangeTraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "min_distance".to_string(),
            reason: "min_distance must be smaller than lookback".to_string(),
        });
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), RangeTraderError> {
    for key in ["buy_threshold_pct", "sell_threshold_pct"] {
        let value = config.get_double("strategy", key, DEFAULT_BUY_THRESHOLD_PCT);
        if value < 0.0 || value >= 100.0 {
            return Err(RangeTraderError::ConfigInvalid {
                section: "strategy".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be in [0, 100)"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn minimal_valid_config() {
        let config = adapter("[data]\npath = /tmp/bars.db\n");
        assert!(validate_data_config(&config).is_ok());
        assert!(validate_backtest_config(&config).is_ok());
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn missing_data_path_rejected() {
        let config = adapter("[data]\nsource = csv\n");
        assert!(matches!(
            validate_data_config(&config),
            Err(RangeTraderError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn unknown_data_source_rejected() {
        let config = adapter("[data]\nsource = postgres\npath = /tmp\n");
        assert!(matches!(
            validate_data_config(&config),
            Err(RangeTraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn non_positive_capital_rejected() {
        let config = adapter("[data]\npath = x\n[backtest]\ninitial_capital = 0\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn position_size_out_of_range_rejected() {
        let config = adapter("[backtest]\nposition_size = 1.5\n");
        assert!(validate_backtest_config(&config).is_err());

        let config = adapter("[backtest]\nposition_size = 0\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn bad_date_rejected() {
        let config = adapter("[backtest]\nstart_date = 2025-13-40\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn inverted_date_range_rejected() {
        let config =
            adapter("[backtest]\nstart_date = 2025-06-01\nend_date = 2025-01-01\n");
        assert!(validate_backtest_config(&config).is_err());
    }

    #[test]
    fn lookback_too_small_rejected() {
        let config = adapter("[strategy]\nlookback = 1\n");
        assert!(validate_strategy_config(&config).is_err());
    }

    #[test]
    fn min_distance_must_fit_lookback() {
        let config = adapter("[strategy]\nlookback = 10\nmin_distance = 10\n");
        assert!(validate_strategy_config(&config).is_err());

        let config = adapter("[strategy]\nlookback = 10\nmin_distance = 3\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn threshold_bounds() {
        let config = adapter("[strategy]\nbuy_threshold_pct = -1\n");
        assert!(validate_strategy_config(&config).is_err());

        let config = adapter("[strategy]\nsell_threshold_pct = 100\n");
        assert!(validate_strategy_config(&config).is_err());
    }
}
