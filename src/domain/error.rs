//! Domain error types.

/// Top-level error type for rangetrader.
#[derive(Debug, thiserror::Error)]
pub enum RangeTraderError {
    #[error("no price data supplied")]
    EmptyInput,

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("no completed trades to summarize")]
    NoCompletedTrades,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RangeTraderError> for std::process::ExitCode {
    fn from(err: &RangeTraderError) -> Self {
        let code: u8 = match err {
            RangeTraderError::Io(_) => 1,
            RangeTraderError::ConfigParse { .. }
            | RangeTraderError::ConfigMissing { .. }
            | RangeTraderError::ConfigInvalid { .. } => 2,
            RangeTraderError::Database { .. } | RangeTraderError::DatabaseQuery { .. } => 3,
            RangeTraderError::EmptyInput
            | RangeTraderError::InsufficientData { .. }
            | RangeTraderError::NoCompletedTrades => 5,
        };
        std::process::ExitCode::from(code)
    }
}
