//! Exit codes for the bb-core CLI.
//!
//! Exit codes communicate the run outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (the report was computed)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use bb_common::{Error, ErrorCategory};

/// Exit codes for bb-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-9)
    // ========================================================================
    /// Every stage succeeded, report persisted.
    Clean = 0,

    /// Report computed but persistence failed.
    PartialFail = 3,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Invalid or unreadable experiment configuration
    ConfigError = 11,

    /// Dataset missing, unsupported or malformed
    DataError = 12,

    /// Model training or prediction failed
    ModelError = 13,

    /// Robustness evaluation failed
    EvaluationError = 14,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// Operation timed out
    TimeoutError = 22,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Clean run.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// The run produced a report (codes 0-9).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// User/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        let code = self as i32;
        code >= 20
    }

    /// Any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DataError => "ERR_DATA",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::EvaluationError => "ERR_EVALUATION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::TimeoutError => "ERR_TIMEOUT",
        }
    }

    /// Exit code for an error that ended the run.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::Timeout { .. } => ExitCode::TimeoutError,
            Error::Persistence(_) => ExitCode::PartialFail,
            Error::UnsupportedFormat(_) => ExitCode::ConfigError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Data => ExitCode::DataError,
                ErrorCategory::Model => ExitCode::ModelError,
                ErrorCategory::Evaluation => ExitCode::EvaluationError,
                ErrorCategory::Io => ExitCode::IoError,
                ErrorCategory::Internal => ExitCode::InternalError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ExitCode::for_error(&Error::DatasetNotFound("x".into())),
            ExitCode::DataError
        );
        assert_eq!(
            ExitCode::for_error(&Error::UnsupportedFormat(".xlsx".into())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::for_error(&Error::Training("x".into())),
            ExitCode::ModelError
        );
        assert_eq!(
            ExitCode::for_error(&Error::Timeout {
                stage: "drift".into(),
                timeout_ms: 1
            }),
            ExitCode::TimeoutError
        );
        assert_eq!(
            ExitCode::for_error(&Error::Persistence("disk".into())),
            ExitCode::PartialFail
        );
    }
}
