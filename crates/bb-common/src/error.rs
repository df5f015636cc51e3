//! Error types for the robustness auditor.
//!
//! Every error carries a numeric code, a category, and remediation text so
//! both humans and automation can act on it.
//!
//! # Human output
//! ```text
//! Error [E1202]: data error: unsupported dataset format: .xlsx
//!
//! Hint: Convert the dataset to .csv, .parquet or .arff.
//! ```
//!
//! # Agent output
//! ```json
//! {
//!   "code": 1202,
//!   "category": "data",
//!   "message": "unsupported dataset format: .xlsx",
//!   "recoverable": false,
//!   "remediation": "Convert the dataset to .csv, .parquet or .arff."
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the auditor error.
pub type Result<T> = std::result::Result<T, Error>;

/// Error category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration errors (10xx)
    Config,
    /// Dataset loading and preprocessing errors (12xx)
    Data,
    /// Model training and prediction errors (13xx)
    Model,
    /// Metric and drift evaluation errors (14xx)
    Evaluation,
    /// Persistence and I/O errors (21xx)
    Io,
    /// Internal errors (90xx)
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Data => "data",
            ErrorCategory::Model => "model",
            ErrorCategory::Evaluation => "evaluation",
            ErrorCategory::Io => "io",
            ErrorCategory::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

/// Unified error type.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10xx)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    // Data errors (12xx)
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("label column missing: {0}")]
    MissingLabel(String),

    #[error("dataset too small: {0}")]
    InsufficientData(String),

    // Model errors (13xx)
    #[error("model training failed: {0}")]
    Training(String),

    #[error("prediction failed: {0}")]
    Prediction(String),

    // Evaluation errors (14xx)
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("drift backend {backend} failed ({kind}): {message}")]
    Backend {
        backend: String,
        kind: crate::drift::BackendErrorKind,
        message: String,
    },

    // Persistence errors (21xx)
    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Internal errors (90xx)
    #[error("stage {stage} failed: {message}")]
    FatalStage { stage: String, message: String },

    #[error("stage {stage} timed out after {timeout_ms} ms")]
    Timeout { stage: String, timeout_ms: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            Error::Configuration(_) => 1001,
            Error::InvalidParameter { .. } => 1002,
            Error::DatasetNotFound(_) => 1201,
            Error::UnsupportedFormat(_) => 1202,
            Error::MalformedDataset(_) => 1203,
            Error::MissingLabel(_) => 1204,
            Error::InsufficientData(_) => 1205,
            Error::Training(_) => 1301,
            Error::Prediction(_) => 1302,
            Error::Evaluation(_) => 1401,
            Error::LengthMismatch { .. } => 1402,
            Error::Backend { .. } => 1403,
            Error::Persistence(_) => 2101,
            Error::Io(_) => 2102,
            Error::Json(_) => 2103,
            Error::FatalStage { .. } => 9000,
            Error::Timeout { .. } => 9001,
            Error::Internal(_) => 9002,
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration(_) | Error::InvalidParameter { .. } => ErrorCategory::Config,
            Error::DatasetNotFound(_)
            | Error::UnsupportedFormat(_)
            | Error::MalformedDataset(_)
            | Error::MissingLabel(_)
            | Error::InsufficientData(_) => ErrorCategory::Data,
            Error::Training(_) | Error::Prediction(_) => ErrorCategory::Model,
            Error::Evaluation(_) | Error::LengthMismatch { .. } | Error::Backend { .. } => {
                ErrorCategory::Evaluation
            }
            Error::Persistence(_) | Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
            Error::FatalStage { .. } | Error::Timeout { .. } | Error::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Whether retrying the same operation might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Persistence(_) | Error::Io(_) | Error::Timeout { .. } | Error::Backend { .. }
        )
    }

    /// Human-readable remediation hint.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Error::Configuration(_) | Error::InvalidParameter { .. } => {
                Some("Check the experiment config file or the BB_CONFIG path.")
            }
            Error::DatasetNotFound(_) => Some("Check the --data path."),
            Error::UnsupportedFormat(_) => Some("Convert the dataset to .csv, .parquet or .arff."),
            Error::MalformedDataset(_) => {
                Some("Ensure the file has a header row and consistent column counts.")
            }
            Error::MissingLabel(_) => Some(
                "Set data.label_column, name the column `label`, or put the label last.",
            ),
            Error::InsufficientData(_) => {
                Some("Provide more rows so both train and test splits are non-empty.")
            }
            Error::Training(_) | Error::Prediction(_) => {
                Some("Try a simpler model with --model majority to isolate the failure.")
            }
            Error::Persistence(_) | Error::Io(_) => {
                Some("Check that the output directory is writable.")
            }
            Error::Timeout { .. } => Some("Raise the stage timeout or reduce dataset size."),
            _ => None,
        }
    }

    /// Short headline suitable for one-line summaries.
    pub fn headline(&self) -> String {
        format!("[E{}] {}", self.code(), self)
    }
}

/// Machine-readable view of an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            remediation: err.remediation().map(str::to_string),
        }
    }
}

impl StructuredError {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{{\"code\":{}}}", self.code))
    }
}

/// Format an error for terminal output.
pub fn format_error_human(err: &Error) -> String {
    let mut out = format!("Error [E{}]: {} error: {}", err.code(), err.category(), err);
    if let Some(hint) = err.remediation() {
        out.push_str("\n\nHint: ");
        out.push_str(hint);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::UnsupportedFormat(".xlsx".into()).code(), 1202);
        assert_eq!(Error::Training("x".into()).code(), 1301);
        assert_eq!(
            Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")).code(),
            2102
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::Configuration("x".into()).category(),
            ErrorCategory::Config
        );
        assert_eq!(
            Error::LengthMismatch {
                expected: 3,
                actual: 2
            }
            .category(),
            ErrorCategory::Evaluation
        );
        assert_eq!(Error::Persistence("x".into()).category(), ErrorCategory::Io);
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::Persistence("disk full".into()).is_recoverable());
        assert!(!Error::MissingLabel("y".into()).is_recoverable());
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::UnsupportedFormat(".xlsx".into());
        let structured = StructuredError::from(&err);
        let json = structured.to_json();
        assert!(json.contains("\"code\": 1202"));
        assert!(json.contains("\"category\": \"data\""));
        assert!(json.contains("remediation"));
    }

    #[test]
    fn test_format_error_human() {
        let text = format_error_human(&Error::DatasetNotFound("missing.csv".into()));
        assert!(text.starts_with("Error [E1201]: data error"));
        assert!(text.contains("Hint: Check the --data path."));
    }
}
