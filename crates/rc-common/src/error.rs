//! Error types for riskcut.

use thiserror::Error;

/// Result type alias for riskcut operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for riskcut.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid threshold grid: {0}")]
    InvalidGrid(String),

    // Data-shape errors (20-29)
    #[error("dataset error at row {row}: {message}")]
    Dataset { row: usize, message: String },

    /// `column` is None when the whole dataset or partition is too small.
    #[error("insufficient data{}: {reason}", column_context(.column))]
    InsufficientData {
        column: Option<usize>,
        reason: String,
    },

    #[error("resampling failed with {minority_count} minority samples: {reason}")]
    Resampling {
        minority_count: usize,
        reason: String,
    },

    #[error("stratification infeasible: class {class} has {count} samples but {folds} folds were requested")]
    InsufficientSamples {
        class: u8,
        count: usize,
        folds: usize,
    },

    #[error("length mismatch in {context}: {left} vs {right}")]
    LengthMismatch {
        context: &'static str,
        left: usize,
        right: usize,
    },

    // Selection errors (30-39)
    #[error("no valid threshold: all {folds} folds failed to produce a cost")]
    NoValidThreshold { folds: usize },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn column_context(column: &Option<usize>) -> String {
    column.map(|c| format!(" in column {c}")).unwrap_or_default()
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidGrid(_) => 11,
            Error::Dataset { .. } => 20,
            Error::InsufficientData { .. } => 21,
            Error::Resampling { .. } => 22,
            Error::InsufficientSamples { .. } => 23,
            Error::LengthMismatch { .. } => 24,
            Error::NoValidThreshold { .. } => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Csv(_) => 62,
        }
    }

    /// Taxonomy name reported to users when a run fails.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidGrid(_) => "ConfigError",
            Error::Dataset { .. } | Error::Csv(_) => "DatasetError",
            Error::InsufficientData { .. } => "InsufficientDataError",
            Error::Resampling { .. } => "ResamplingError",
            Error::InsufficientSamples { .. } => "InsufficientSamplesError",
            Error::LengthMismatch { .. } => "LengthMismatchError",
            Error::NoValidThreshold { .. } => "NoValidThresholdError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "SerializationError",
        }
    }

    /// Data-shape errors mean the input is unsuitable for the procedure.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::Dataset { .. }
                | Error::Csv(_)
                | Error::InsufficientData { .. }
                | Error::Resampling { .. }
                | Error::InsufficientSamples { .. }
                | Error::LengthMismatch { .. }
        )
    }
}
