//! Black-box robustness auditor: common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Typed pipeline records (metric sets, degradation sets, drift results)
//! - Run identity
//! - The unified error type
//! - Output format specifications

pub mod drift;
pub mod error;
pub mod id;
pub mod metrics;
pub mod output;

pub use drift::{
    BackendErrorKind, BackendFailure, DriftComparison, DriftOutcome, DriftPayload, DriftResult,
    FeatureDrift, FeatureDriftReport, FeatureKind, StatTest, TwoSampleTest,
};
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use id::RunId;
pub use metrics::{DegradationSet, Metric, MetricSet, RobustnessReport};
pub use output::OutputFormat;

/// Schema version stamped into persisted reports and manifests.
pub const SCHEMA_VERSION: &str = "1.0.0";
