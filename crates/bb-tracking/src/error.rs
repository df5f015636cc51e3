//! Error types for run tracking.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or reading a run.
#[derive(Error, Debug)]
pub enum TrackingError {
    /// I/O error on a specific path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run id cannot be used as a directory name.
    #[error("invalid run id '{0}'")]
    InvalidRunId(String),

    /// Artifact name is empty, reserved, or escapes the run directory.
    #[error("invalid artifact name '{0}'")]
    InvalidArtifact(String),

    /// Two artifacts with the same name.
    #[error("duplicate artifact '{0}'")]
    DuplicateArtifact(String),

    /// Checksum verification failed.
    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// File listed in the manifest is absent.
    #[error("missing file: {0}")]
    MissingFile(String),

    /// Manifest from an unsupported schema version.
    #[error("unsupported manifest version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    /// Every attempt failed.
    #[error("persistence failed after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl TrackingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrackingError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, TrackingError::Io { .. })
    }
}

impl From<TrackingError> for bb_common::Error {
    fn from(err: TrackingError) -> Self {
        bb_common::Error::Persistence(err.to_string())
    }
}

/// Result type alias for tracking operations.
pub type Result<T> = std::result::Result<T, TrackingError>;
