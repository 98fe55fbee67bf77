use std::error::Error as StdError;

use thiserror::Error;

use crate::pipeline::PipelineState;
use crate::validation::Invariant;

/// Convenience result type for pipeline operations.
pub type EtlResult<T> = Result<T, EtlError>;

/// Error type returned by every stage of the pipeline.
///
/// Malformed dates and numbers are never reported here: the Normalizer coerces them to
/// [`crate::types::Value::Null`] and the Validator rejects the resulting nulls.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Parquet write error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// A stage needs a column the record set does not have.
    #[error("schema mismatch: missing required column '{column}'. columns={available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A business invariant does not hold on the merged record set.
    #[error("validation failed [{check}] on column '{column}': {message}")]
    Validation {
        check: Invariant,
        column: String,
        message: String,
    },

    /// The exporter was asked for a format outside {csv, parquet}.
    #[error("unsupported export format '{format}' (expected csv or parquet)")]
    UnsupportedFormat { format: String },

    /// The orchestrator was asked to move between states out of sequence.
    #[error("invalid pipeline transition from {from:?} to {to:?}")]
    InvalidTransition { from: PipelineState, to: PipelineState },

    /// The log sink could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Coarse classification of an [`EtlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing input file, unwritable output path, and other file-access failures.
    Io,
    /// Input shape problems (missing columns, unreadable CSV structure).
    Schema,
    /// An invariant violation raised by the Validator.
    Invariant,
    /// Unsupported export format.
    UnsupportedFormat,
    /// Orchestrator misuse or process setup failure.
    Internal,
}

impl EtlError {
    /// Classify this error.
    ///
    /// CSV and Parquet errors that wrap an I/O failure count as [`ErrorKind::Io`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Io(_) => ErrorKind::Io,
            EtlError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => ErrorKind::Io,
                _ => ErrorKind::Schema,
            },
            EtlError::Parquet(err) => {
                if error_chain_contains_io(err) {
                    ErrorKind::Io
                } else {
                    ErrorKind::Internal
                }
            }
            EtlError::MissingColumn { .. } => ErrorKind::Schema,
            EtlError::Validation { .. } => ErrorKind::Invariant,
            EtlError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            EtlError::InvalidTransition { .. } | EtlError::Logging(_) => ErrorKind::Internal,
        }
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
