//! Error types for report synthesis.

use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while building or rendering a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A required stage output was never supplied to the builder.
    #[error("missing required data: {0}")]
    MissingData(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Markdown that does not follow the section contract.
    #[error("malformed report at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl From<ReportError> for bb_common::Error {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::JsonError(e) => bb_common::Error::Json(e),
            other => bb_common::Error::Internal(other.to_string()),
        }
    }
}
