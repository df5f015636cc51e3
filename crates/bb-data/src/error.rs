//! Errors from dataset loading and manipulation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed dataset at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Column {column} has {actual} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Label error: {0}")]
    Label(String),

    #[error("Dataset has no rows")]
    Empty,

    #[error("No feature columns remain after preprocessing")]
    NoFeatures,

    #[error("Cannot split {rows} rows with test_size {test_size}")]
    Split { rows: usize, test_size: f64 },
}

impl From<DataError> for bb_common::Error {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Io(e) => bb_common::Error::Io(e),
            DataError::NotFound(p) => bb_common::Error::DatasetNotFound(p),
            DataError::UnsupportedFormat(ext) => bb_common::Error::UnsupportedFormat(ext),
            DataError::Label(msg) => bb_common::Error::MissingLabel(msg),
            DataError::Empty => bb_common::Error::InsufficientData("dataset has no rows".into()),
            e @ DataError::NoFeatures => bb_common::Error::InsufficientData(e.to_string()),
            e @ DataError::Split { .. } => bb_common::Error::InsufficientData(e.to_string()),
            other => bb_common::Error::MalformedDataset(other.to_string()),
        }
    }
}
