//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvBarSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::config_validation::{
    validate_backtest_config, validate_data_config, validate_strategy_config,
    DEFAULT_BUY_THRESHOLD_PCT, DEFAULT_INITIAL_CAPITAL, DEFAULT_LOOKBACK, DEFAULT_MIN_DISTANCE,
    DEFAULT_POSITION_SIZE, DEFAULT_SELL_THRESHOLD_PCT, DEFAULT_TICKER,
};
use crate::domain::engine::{compare_strategies, run_backtest, BacktestConfig};
use crate::domain::error::RangeTraderError;
use crate::domain::levels::levels_from_bars;
use crate::domain::ohlcv::DailyBar;
use crate::domain::scaled_strategy::{
    run_scaled_backtest, run_support_bounce_backtest, ScaledConfig,
};
use crate::domain::snapshot::current_signal;
use crate::domain::strategy::{LevelParams, LevelStrategy, Strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "rangetrader", about = "Support/resistance range-trading backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single-position backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Compare level strategies across lookbacks, e.g. "30,60,100"
        #[arg(long)]
        compare: Option<String>,
    },
    /// Run a scaled (multi-tranche) backtest
    Scaled {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Tranche plan: "tranches" (30/30/40) or "bounce" (support zone)
        #[arg(long, default_value = "tranches")]
        plan: String,
    },
    /// Print the current trading signal
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show current support/resistance levels and their extrema
    Levels {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Show the stored data range for a ticker
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            output,
            compare,
        } => run_backtest_cmd(&config, ticker.as_deref(), output.as_ref(), compare.as_deref()),
        Command::Scaled {
            config,
            ticker,
            output,
            plan,
        } => run_scaled_cmd(&config, ticker.as_deref(), output.as_ref(), &plan),
        Command::Signal {
            config,
            ticker,
            output,
        } => run_signal_cmd(&config, ticker.as_deref(), output.as_ref()),
        Command::Levels { config, ticker } => run_levels_cmd(&config, ticker.as_deref()),
        Command::Info { config, ticker } => run_info_cmd(&config, ticker.as_deref()),
        Command::Validate { config } => run_validate_cmd(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RangeTraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: &RangeTraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn validate_all(adapter: &FileConfigAdapter) -> Result<(), RangeTraderError> {
    validate_data_config(adapter)?;
    validate_backtest_config(adapter)?;
    validate_strategy_config(adapter)?;
    Ok(())
}

pub fn build_level_params(config: &dyn ConfigPort) -> LevelParams {
    LevelParams {
        lookback: config.get_int("strategy", "lookback", DEFAULT_LOOKBACK) as usize,
        min_distance: config.get_int("strategy", "min_distance", DEFAULT_MIN_DISTANCE) as usize,
        buy_threshold_pct: config.get_double(
            "strategy",
            "buy_threshold_pct",
            DEFAULT_BUY_THRESHOLD_PCT,
        ),
        sell_threshold_pct: config.get_double(
            "strategy",
            "sell_threshold_pct",
            DEFAULT_SELL_THRESHOLD_PCT,
        ),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> BacktestConfig {
    BacktestConfig {
        initial_capital: config.get_double(
            "backtest",
            "initial_capital",
            DEFAULT_INITIAL_CAPITAL,
        ),
        position_size: config.get_double("backtest", "position_size", DEFAULT_POSITION_SIZE),
    }
}

pub fn build_scaled_config(config: &dyn ConfigPort) -> ScaledConfig {
    ScaledConfig {
        initial_capital: config.get_double(
            "backtest",
            "initial_capital",
            DEFAULT_INITIAL_CAPITAL,
        ),
        lookback: config.get_int("strategy", "lookback", DEFAULT_LOOKBACK) as usize,
        min_distance: config.get_int("strategy", "min_distance", DEFAULT_MIN_DISTANCE) as usize,
    }
}

fn resolve_ticker(config: &dyn ConfigPort, override_ticker: Option<&str>) -> String {
    match override_ticker {
        Some(t) => t.to_string(),
        None => config
            .get_string("data", "ticker")
            .unwrap_or_else(|| DEFAULT_TICKER.to_string()),
    }
}

fn resolve_date(config: &dyn ConfigPort, key: &str) -> Option<NaiveDate> {
    config
        .get_string("backtest", key)
        .and_then(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok())
}

fn make_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, RangeTraderError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "sqlite".to_string());

    match source.as_str() {
        "csv" => {
            let path = config.get_string("data", "path").ok_or_else(|| {
                RangeTraderError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                }
            })?;
            Ok(Box::new(CsvBarSource::new(PathBuf::from(path))))
        }
        "sqlite" => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteBarSource;
                Ok(Box::new(SqliteBarSource::from_config(config)?))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(RangeTraderError::ConfigInvalid {
                    section: "data".into(),
                    key: "source".into(),
                    reason: "built without the sqlite feature".into(),
                })
            }
        }
        other => Err(RangeTraderError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{other}'"),
        }),
    }
}

/// Load, validate and fetch: the shared front half of every command.
fn load_bars(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
) -> Result<(FileConfigAdapter, String, Vec<DailyBar>), ExitCode> {
    let adapter = load_config(config_path)?;
    if let Err(e) = validate_all(&adapter) {
        return Err(fail(&e));
    }

    let ticker = resolve_ticker(&adapter, ticker_override);
    let start = resolve_date(&adapter, "start_date");
    let end = resolve_date(&adapter, "end_date");

    let data_port = match make_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return Err(fail(&e)),
    };

    let bars = match data_port.fetch_daily(&ticker, start, end) {
        Ok(bars) => bars,
        Err(e) => return Err(fail(&e)),
    };

    eprintln!("Loaded {} bars for {}", bars.len(), ticker);
    Ok((adapter, ticker, bars))
}

fn run_backtest_cmd(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
    output_path: Option<&PathBuf>,
    compare: Option<&str>,
) -> ExitCode {
    let (adapter, ticker, bars) = match load_bars(config_path, ticker_override) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let bt_config = build_backtest_config(&adapter);
    let params = build_level_params(&adapter);

    if let Some(lookbacks) = compare {
        return run_compare(&bars, &bt_config, &params, lookbacks);
    }

    eprintln!(
        "Backtesting {} (lookback {}, thresholds {}%/{}%)",
        ticker, params.lookback, params.buy_threshold_pct, params.sell_threshold_pct
    );

    let mut strategy = LevelStrategy::new(params);
    let result = match run_backtest(&mut strategy, &bars, &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let report = TextReportAdapter;
    eprint!("{}", report.render_backtest(&result));

    if let Some(path) = output_path {
        if let Err(e) = report.write_backtest(&result, path) {
            return fail(&e);
        }
        eprintln!("Report written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_compare(
    bars: &[DailyBar],
    bt_config: &BacktestConfig,
    params: &LevelParams,
    lookbacks: &str,
) -> ExitCode {
    let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
    for token in lookbacks.split(',') {
        let lookback: usize = match token.trim().parse() {
            Ok(n) if n >= 2 => n,
            _ => {
                let err = RangeTraderError::ConfigInvalid {
                    section: "cli".into(),
                    key: "compare".into(),
                    reason: format!("'{}' is not a valid lookback", token.trim()),
                };
                return fail(&err);
            }
        };
        strategies.push(Box::new(LevelStrategy::new(LevelParams {
            lookback,
            ..params.clone()
        })));
    }

    let results = match compare_strategies(&mut strategies, bars, bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    eprintln!("\n=== Strategy Comparison ===");
    for result in &results {
        let trades = result
            .summary
            .as_ref()
            .map(|s| s.total_trades)
            .unwrap_or(0);
        eprintln!(
            "  {:<12} return {:>+7.2}%  alpha {:>+7.2}%  trades {}",
            result.strategy_name, result.total_return_pct, result.alpha, trades
        );
    }
    ExitCode::SUCCESS
}

fn run_scaled_cmd(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
    output_path: Option<&PathBuf>,
    plan: &str,
) -> ExitCode {
    let (adapter, ticker, bars) = match load_bars(config_path, ticker_override) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let config = build_scaled_config(&adapter);
    eprintln!(
        "Scaled backtest for {} (plan {}, lookback {})",
        ticker, plan, config.lookback
    );

    let result = match plan {
        "tranches" => run_scaled_backtest(&bars, &config),
        "bounce" => run_support_bounce_backtest(&bars, &config),
        other => {
            let err = RangeTraderError::ConfigInvalid {
                section: "cli".into(),
                key: "plan".into(),
                reason: format!("unknown plan '{other}', expected tranches or bounce"),
            };
            return fail(&err);
        }
    };

    let result = match result {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let report = TextReportAdapter;
    eprint!("{}", report.render_scaled(&result));

    if let Some(path) = output_path {
        if let Err(e) = report.write_scaled(&result, path) {
            return fail(&e);
        }
        eprintln!("Report written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_signal_cmd(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let (adapter, _ticker, bars) = match load_bars(config_path, ticker_override) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let params = build_level_params(&adapter);
    let snapshot = match current_signal(&bars, &params) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let report = TextReportAdapter;
    print!("{}", report.render_snapshot(&snapshot));

    if let Some(path) = output_path {
        if let Err(e) = report.write_snapshot(&snapshot, path) {
            return fail(&e);
        }
        eprintln!("Report written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_levels_cmd(config_path: &PathBuf, ticker_override: Option<&str>) -> ExitCode {
    let (adapter, ticker, bars) = match load_bars(config_path, ticker_override) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let params = build_level_params(&adapter);
    let Some((levels, peaks, troughs)) =
        levels_from_bars(&bars, params.lookback, params.min_distance)
    else {
        let err = RangeTraderError::InsufficientData {
            bars: bars.len(),
            minimum: params.lookback,
        };
        return fail(&err);
    };

    println!(
        "PEAKS & TROUGHS for {} (last {} days)",
        ticker, params.lookback
    );
    println!("\nPeaks (resistance):");
    for (i, peak) in peaks.iter().enumerate() {
        println!("  {}. {} | ${:>7.2}", i + 1, peak.date, peak.price);
    }
    println!("\nTroughs (support):");
    for (i, trough) in troughs.iter().enumerate() {
        println!("  {}. {} | ${:>7.2}", i + 1, trough.date, trough.price);
    }
    println!("\nTime-weighted resistance: ${:.2}", levels.resistance);
    println!("Time-weighted support:    ${:.2}", levels.support);
    if levels.is_degenerate() {
        println!("warning: degenerate range (resistance <= support)");
    }

    ExitCode::SUCCESS
}

fn run_info_cmd(config_path: &PathBuf, ticker_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&adapter) {
        return fail(&e);
    }

    let ticker = resolve_ticker(&adapter, ticker_override);
    let data_port = match make_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    match data_port.data_range(&ticker) {
        Ok(Some((first, last, count))) => {
            println!("{ticker}: {count} bars, {first} to {last}");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("{ticker}: no data");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_validate_cmd(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        return fail(&e);
    }

    eprintln!("Config validated successfully");
    let params = build_level_params(&adapter);
    eprintln!(
        "  strategy: lookback {}, min_distance {}, thresholds {}%/{}%",
        params.lookback, params.min_distance, params.buy_threshold_pct, params.sell_threshold_pct
    );
    let bt = build_backtest_config(&adapter);
    eprintln!(
        "  backtest: capital ${:.2}, position size {:.2}",
        bt.initial_capital, bt.position_size
    );

    ExitCode::SUCCESS
}
