//! Experiment report synthesis for the robustness auditor.
//!
//! An [`ExperimentReport`] is assembled once per run by
//! [`ExperimentReportBuilder`] from the outputs of the evaluation stages and
//! is immutable afterwards.
//!
//! # Markdown contract
//!
//! The rendered markdown starts with `# Experiment Report`, followed by run
//! metadata bullets and exactly four sections, always in this order:
//!
//! - `## Reference Metrics`
//! - `## Mutated Metrics`
//! - `## Drift Report`
//! - `## Robustness Report`
//!
//! Every section body is a list of `- key: value` lines. [`parse_sections`]
//! reads that format back for downstream consumers.
//!
//! # Example
//!
//! ```
//! use bb_common::{DriftComparison, MetricSet, RobustnessReport};
//! use bb_report::{ExperimentReportBuilder, render_markdown};
//!
//! let metrics = MetricSet::from_values(0.9, 0.9, 0.9, 0.9);
//! let report = ExperimentReportBuilder::new("bb-20260115-143022-abcd")
//!     .reference_metrics(metrics.clone())
//!     .mutated_metrics(metrics.clone())
//!     .robustness(RobustnessReport {
//!         reference_metrics: metrics.clone(),
//!         mutated_metrics: metrics,
//!         degradation: Default::default(),
//!     })
//!     .drift(DriftComparison::new())
//!     .build()
//!     .unwrap();
//! assert!(render_markdown(&report).starts_with("# Experiment Report"));
//! ```

pub mod error;
pub mod markdown;
pub mod report;

pub use error::{ReportError, Result};
pub use markdown::{
    parse_sections, render_json, render_markdown, ReportSection, REPORT_TITLE, SECTION_TITLES,
};
pub use report::{ExperimentReport, ExperimentReportBuilder};
