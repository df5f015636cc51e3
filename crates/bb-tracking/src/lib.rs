//! Experiment tracking for the robustness auditor.
//!
//! Each run is persisted as a directory `<root>/<run_id>/` holding the
//! rendered report, any artifacts supplied with the [`RunRecord`], and a
//! `manifest.json` that lists parameters, metrics and every file with its
//! SHA-256 checksum and size.
//!
//! # Layout
//!
//! - `manifest.json`: run metadata, parameters, metrics, file listing
//! - `experiment_report.md`: rendered markdown report
//! - artifacts: `report.json`, `feature_attribution.json`,
//!   `mutated_features.csv`, ... as supplied by the caller
//!
//! Files are written to a temporary name and renamed into place, and the
//! manifest is written last, so a directory with a manifest is complete.
//!
//! # Example
//!
//! ```no_run
//! use bb_tracking::{FsRunSink, RunRecord, RunSink};
//!
//! let mut record = RunRecord::new("bb-20260115-143022-abcd");
//! record.add_parameter("model_type", "rf");
//! record.add_metric("reference.accuracy", 0.93);
//! let sink = FsRunSink::new("runs").with_retries(2);
//! let receipt = sink.persist(&record, "# Experiment Report\n").unwrap();
//! println!("{}", receipt.run_dir.display());
//! ```

pub mod error;
pub mod manifest;
pub mod reader;
pub mod record;
pub mod sink;

pub use error::{Result, TrackingError};
pub use manifest::{FileEntry, RunManifest, MANIFEST_FILE_NAME, MANIFEST_SCHEMA_VERSION};
pub use reader::RunReader;
pub use record::{Artifact, RunRecord};
pub use sink::{FsRunSink, PersistReceipt, RunSink, REPORT_FILE_NAME};
