//! Domain error types.

/// Top-level error type for tradelog.
#[derive(Debug, thiserror::Error)]
pub enum TradelogError {
    #[error("journal error: {reason}")]
    Journal { reason: String },

    #[error("journal row {row}: {reason}")]
    JournalRow { row: usize, reason: String },

    #[error("invalid trade for {symbol}: {reason}")]
    InvalidTrade { symbol: String, reason: String },

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

    #[error("empty journal: {operation} needs at least one closed trade")]
    EmptyJournal { operation: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradelogError> for std::process::ExitCode {
    fn from(err: &TradelogError) -> Self {
        let code: u8 = match err {
            TradelogError::Io(_) | TradelogError::Report { .. } => 1,
            TradelogError::ConfigParse { .. }
            | TradelogError::ConfigMissing { .. }
            | TradelogError::ConfigInvalid { .. } => 2,
            TradelogError::Journal { .. } | TradelogError::JournalRow { .. } => 3,
            TradelogError::InvalidTrade { .. } => 4,
            TradelogError::EmptyJournal { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
