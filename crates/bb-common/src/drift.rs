//! Drift measurement records.
//!
//! A [`DriftResult`] is produced per backend and carries either a payload or
//! a typed failure, never both. A [`DriftComparison`] collects the results of
//! every configured backend for one reference/current pair.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Why a drift backend did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// Not enough rows or columns to run the test.
    InsufficientData,
    /// Reference and current share no usable feature.
    NoSharedFeatures,
    /// Statistic evaluated to NaN or infinity.
    Numerical,
    /// Backend exceeded its time bound.
    Timeout,
    /// Backend worker panicked or disconnected.
    Panicked,
    /// Any other backend-specific failure.
    Internal,
}

impl BackendErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendErrorKind::InsufficientData => "insufficient_data",
            BackendErrorKind::NoSharedFeatures => "no_shared_features",
            BackendErrorKind::Numerical => "numerical",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Panicked => "panicked",
            BackendErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct BackendFailure {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendFailure {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Column type seen by a per-feature test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// Statistical test applied to one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTest {
    /// Two-sample Kolmogorov-Smirnov.
    Ks,
    /// Chi-square test of homogeneity.
    ChiSquare,
}

impl fmt::Display for StatTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatTest::Ks => f.write_str("ks"),
            StatTest::ChiSquare => f.write_str("chi_square"),
        }
    }
}

/// Per-feature drift test outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub feature: String,
    pub kind: FeatureKind,
    pub test: StatTest,
    pub statistic: f64,
    pub p_value: f64,
    /// 1-Wasserstein distance normalized by the reference standard deviation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasserstein: Option<f64>,
    pub drifted: bool,
}

/// Multi-metric report over every shared feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDriftReport {
    pub features: Vec<FeatureDrift>,
    /// Reference features absent from the current dataset.
    pub missing_features: Vec<String>,
    pub drifted_count: usize,
    pub share_drifted: f64,
    pub stattest_threshold: f64,
    pub drift_share: f64,
    pub dataset_drift: bool,
}

/// Aggregate two-sample test over all numeric features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoSampleTest {
    pub method: String,
    pub statistic: f64,
    pub p_value: f64,
    pub threshold: f64,
    pub permutations: usize,
    pub bandwidth: f64,
    pub n_reference: usize,
    pub n_current: usize,
    pub n_features: usize,
    pub drifted: bool,
}

/// Backend-specific drift measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriftPayload {
    FeatureReport(FeatureDriftReport),
    TwoSample(TwoSampleTest),
}

impl DriftPayload {
    /// Headline drift score.
    ///
    /// Share of drifted features for a feature report, the test statistic for
    /// a two-sample test.
    pub fn score(&self) -> f64 {
        match self {
            DriftPayload::FeatureReport(r) => r.share_drifted,
            DriftPayload::TwoSample(t) => t.statistic,
        }
    }

    /// Aggregate p-value, when the backend produces one.
    pub fn p_value(&self) -> Option<f64> {
        match self {
            DriftPayload::FeatureReport(_) => None,
            DriftPayload::TwoSample(t) => Some(t.p_value),
        }
    }

    pub fn drift_detected(&self) -> bool {
        match self {
            DriftPayload::FeatureReport(r) => r.dataset_drift,
            DriftPayload::TwoSample(t) => t.drifted,
        }
    }
}

/// Success or failure of one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DriftOutcome {
    Success(DriftPayload),
    Failed(BackendFailure),
}

/// Result of one drift backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub backend: String,
    pub outcome: DriftOutcome,
    pub elapsed_ms: u64,
}

impl DriftResult {
    pub fn success(backend: impl Into<String>, payload: DriftPayload, elapsed_ms: u64) -> Self {
        Self {
            backend: backend.into(),
            outcome: DriftOutcome::Success(payload),
            elapsed_ms,
        }
    }

    pub fn failed(backend: impl Into<String>, failure: BackendFailure, elapsed_ms: u64) -> Self {
        Self {
            backend: backend.into(),
            outcome: DriftOutcome::Failed(failure),
            elapsed_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DriftOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&DriftPayload> {
        match &self.outcome {
            DriftOutcome::Success(p) => Some(p),
            DriftOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&BackendFailure> {
        match &self.outcome {
            DriftOutcome::Success(_) => None,
            DriftOutcome::Failed(f) => Some(f),
        }
    }

    pub fn score(&self) -> Option<f64> {
        self.payload().map(DriftPayload::score)
    }

    pub fn p_value(&self) -> Option<f64> {
        self.payload().and_then(DriftPayload::p_value)
    }
}

/// Backend name to result, for every configured backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriftComparison(BTreeMap<String, DriftResult>);

impl DriftComparison {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: DriftResult) {
        self.0.insert(result.backend.clone(), result);
    }

    pub fn get(&self, backend: &str) -> Option<&DriftResult> {
        self.0.get(backend)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriftResult> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Some but not all backends failed.
    pub fn is_partial(&self) -> bool {
        self.failed() > 0 && self.succeeded() > 0
    }
}
