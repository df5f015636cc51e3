//! Tabular datasets for the robustness auditor.
//!
//! This crate provides:
//! - [`Dataset`]: named numeric/categorical columns with a fixed row count
//! - Loaders for `.csv`, `.parquet` and `.arff` files
//! - Preprocessing (forward fill, one-hot encoding) and label extraction
//! - A seeded train/test split
//! - Arrow conversion and CSV serialization of datasets

pub mod arff;
pub mod arrow_io;
pub mod dataset;
pub mod error;
pub mod load;
pub mod preprocess;
pub mod split;

pub use dataset::{Column, Dataset, LabeledDataset};
pub use error::DataError;
pub use load::{load, DatasetFormat};
pub use preprocess::{forward_fill, one_hot_encode, prepare, split_label};
pub use split::{train_test_split, TrainTestSplit};

/// Column name used as the label when no explicit label column is configured.
pub const DEFAULT_LABEL_COLUMN: &str = "label";
