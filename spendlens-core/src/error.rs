//! Error taxonomy for a single statement analysis.
//!
//! Every failure inside extraction, parsing or assembly is recovered into one of
//! these kinds. Callers only ever see `user_message()`; the `Display` text may carry
//! internal detail and is meant for logs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FormatMismatch,
    NoTransactionsFound,
    ExtractionFailure,
    ExtractionTimeout,
    MalformedOutput,
    ProcessSpawnFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FormatMismatch => "format_mismatch",
            ErrorKind::NoTransactionsFound => "no_transactions_found",
            ErrorKind::ExtractionFailure => "extraction_failure",
            ErrorKind::ExtractionTimeout => "extraction_timeout",
            ErrorKind::MalformedOutput => "malformed_output",
            ErrorKind::ProcessSpawnFailure => "process_spawn_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// Document does not match the expected bank/platform layout
    #[error("This does not appear to be a {expected} statement")]
    FormatMismatch { expected: String },

    /// Layout looked valid but no transaction rows were recognized
    #[error("No valid transactions found in the PDF")]
    NoTransactionsFound,

    /// PDF text extraction failed (corrupt, unsupported or not a PDF)
    #[error("PDF text extraction failed: {0}")]
    ExtractionFailure(String),

    /// Extraction exceeded its deadline
    #[error("PDF text extraction timed out after {}s", .0.as_secs())]
    ExtractionTimeout(Duration),

    /// Parser output failed validation before assembly
    #[error("Parser produced malformed output: {0}")]
    MalformedOutput(String),

    /// External extractor process could not be started
    #[error("Could not start extractor process: {0}")]
    ProcessSpawnFailure(String),
}

impl StatementError {
    pub fn format_mismatch(expected: impl Into<String>) -> Self {
        StatementError::FormatMismatch {
            expected: expected.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StatementError::FormatMismatch { .. } => ErrorKind::FormatMismatch,
            StatementError::NoTransactionsFound => ErrorKind::NoTransactionsFound,
            StatementError::ExtractionFailure(_) => ErrorKind::ExtractionFailure,
            StatementError::ExtractionTimeout(_) => ErrorKind::ExtractionTimeout,
            StatementError::MalformedOutput(_) => ErrorKind::MalformedOutput,
            StatementError::ProcessSpawnFailure(_) => ErrorKind::ProcessSpawnFailure,
        }
    }

    /// Message safe to show an end user. Never includes tool output.
    pub fn user_message(&self) -> String {
        match self {
            StatementError::FormatMismatch { .. } | StatementError::NoTransactionsFound => {
                self.to_string()
            }
            StatementError::ExtractionFailure(_) => {
                "Could not read text from the PDF. Please ensure this is a valid PDF file."
                    .to_string()
            }
            StatementError::ExtractionTimeout(_) => {
                "Reading the PDF took too long. Please try a smaller statement.".to_string()
            }
            StatementError::MalformedOutput(_) => "Failed to analyze statement".to_string(),
            StatementError::ProcessSpawnFailure(_) => {
                "Failed to start analysis process".to_string()
            }
        }
    }

    /// Infrastructure failures may be retried by the boundary caller; parse failures never.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StatementError::ProcessSpawnFailure(_))
    }
}

/// Parser patterns are compiled per call; a bad pattern is an internal fault, not a user error.
impl From<regex::Error> for StatementError {
    fn from(err: regex::Error) -> Self {
        StatementError::MalformedOutput(format!("invalid parser pattern: {err}"))
    }
}
