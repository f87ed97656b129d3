//! Domain error types.

use chrono::NaiveDate;

use crate::domain::universe::UniverseError;

/// Why a bar sequence cannot be used as a price series.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,

    #[error("bar {index} dated {date} is not after the previous bar")]
    OutOfOrder { index: usize, date: NaiveDate },

    #[error("duplicate bar for {0}")]
    DuplicateDate(NaiveDate),

    #[error("malformed bar on {date}: {reason}")]
    MalformedBar { date: NaiveDate, reason: String },
}

/// Raised inside a criterion evaluator. Never escapes the evaluator: each one
/// is turned into a failure line carrying this message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("insufficient data for {what}: have {have} bars, need {need}")]
    InsufficientData {
        what: String,
        have: usize,
        need: usize,
    },

    #[error("date alignment with benchmark: {overlap} overlapping dates, need {need}")]
    DateAlignment { overlap: usize, need: usize },

    #[error("cannot compute {what}: denominator is zero")]
    ComputationGuard { what: String },
}

impl EvalError {
    pub fn insufficient(what: impl Into<String>, have: usize, need: usize) -> Self {
        EvalError::InsufficientData {
            what: what.into(),
            have,
            need,
        }
    }

    pub fn guard(what: impl Into<String>) -> Self {
        EvalError::ComputationGuard { what: what.into() }
    }
}

/// Top-level error type for sepagrade.
#[derive(Debug, thiserror::Error)]
pub enum SepaError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid series for {ticker}: {source}")]
    Series {
        ticker: String,
        #[source]
        source: SeriesError,
    },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SepaError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SepaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SepaError> for std::process::ExitCode {
    fn from(err: &SepaError) -> Self {
        let code: u8 = match err {
            SepaError::Io(_) => 1,
            SepaError::ConfigParse { .. } | SepaError::ConfigInvalid { .. } => 2,
            SepaError::Data { .. } | SepaError::Series { .. } => 3,
            SepaError::Universe(_) => 4,
            SepaError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
