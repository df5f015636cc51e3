//! Experiment report model and builder.

use bb_common::{DegradationSet, DriftComparison, MetricSet, RobustnessReport, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Composite result of one pipeline run.
///
/// Fields are private: a report is created by [`ExperimentReportBuilder`]
/// and read through accessors, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    schema_version: String,
    run_id: String,
    generated_at: DateTime<Utc>,
    generator_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dataset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    reference_metrics: MetricSet,
    mutated_metrics: MetricSet,
    degradation: DegradationSet,
    drift: DriftComparison,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
}

impl ExperimentReport {
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn generator_version(&self) -> &str {
        &self.generator_version
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn reference_metrics(&self) -> &MetricSet {
        &self.reference_metrics
    }

    pub fn mutated_metrics(&self) -> &MetricSet {
        &self.mutated_metrics
    }

    pub fn degradation(&self) -> &DegradationSet {
        &self.degradation
    }

    pub fn drift(&self) -> &DriftComparison {
        &self.drift
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Robustness view of the report.
    pub fn robustness(&self) -> RobustnessReport {
        RobustnessReport {
            reference_metrics: self.reference_metrics.clone(),
            mutated_metrics: self.mutated_metrics.clone(),
            degradation: self.degradation.clone(),
        }
    }
}

/// Collects stage outputs and produces an [`ExperimentReport`].
#[derive(Debug, Clone)]
pub struct ExperimentReportBuilder {
    run_id: String,
    generated_at: Option<DateTime<Utc>>,
    dataset: Option<String>,
    model: Option<String>,
    reference_metrics: Option<MetricSet>,
    mutated_metrics: Option<MetricSet>,
    degradation: Option<DegradationSet>,
    drift: DriftComparison,
    notes: Vec<String>,
}

impl ExperimentReportBuilder {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            generated_at: None,
            dataset: None,
            model: None,
            reference_metrics: None,
            mutated_metrics: None,
            degradation: None,
            drift: DriftComparison::new(),
            notes: Vec::new(),
        }
    }

    /// Pin the generation timestamp (defaults to now at build time).
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn reference_metrics(mut self, metrics: MetricSet) -> Self {
        self.reference_metrics = Some(metrics);
        self
    }

    pub fn mutated_metrics(mut self, metrics: MetricSet) -> Self {
        self.mutated_metrics = Some(metrics);
        self
    }

    pub fn degradation(mut self, degradation: DegradationSet) -> Self {
        self.degradation = Some(degradation);
        self
    }

    /// Set reference metrics, mutated metrics and degradation at once.
    pub fn robustness(self, report: RobustnessReport) -> Self {
        self.reference_metrics(report.reference_metrics)
            .mutated_metrics(report.mutated_metrics)
            .degradation(report.degradation)
    }

    /// Drift results, possibly partial. An empty comparison renders as
    /// unavailable.
    pub fn drift(mut self, drift: DriftComparison) -> Self {
        self.drift = drift;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn build(self) -> Result<ExperimentReport> {
        if self.run_id.is_empty() {
            return Err(ReportError::MissingData("run_id".to_string()));
        }
        let reference_metrics = self
            .reference_metrics
            .ok_or_else(|| ReportError::MissingData("reference metrics".to_string()))?;
        let mutated_metrics = self
            .mutated_metrics
            .ok_or_else(|| ReportError::MissingData("mutated metrics".to_string()))?;
        let degradation = self
            .degradation
            .ok_or_else(|| ReportError::MissingData("degradation".to_string()))?;

        Ok(ExperimentReport {
            schema_version: SCHEMA_VERSION.to_string(),
            run_id: self.run_id,
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            dataset: self.dataset,
            model: self.model,
            reference_metrics,
            mutated_metrics,
            degradation,
            drift: self.drift,
            notes: self.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_common::Metric;

    fn robustness() -> RobustnessReport {
        RobustnessReport {
            reference_metrics: MetricSet::from_values(0.8, 0.8, 0.8, 0.8),
            mutated_metrics: MetricSet::from_values(0.6, 0.6, 0.6, 0.6),
            degradation: Metric::ALL.iter().map(|m| (*m, 25.0)).collect(),
        }
    }

    #[test]
    fn test_builder_requires_metrics() {
        let err = ExperimentReportBuilder::new("bb-run").build().unwrap_err();
        assert!(matches!(err, ReportError::MissingData(_)));

        let err = ExperimentReportBuilder::new("bb-run")
            .reference_metrics(MetricSet::from_values(1.0, 1.0, 1.0, 1.0))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("mutated"));
    }

    #[test]
    fn test_builder_rejects_empty_run_id() {
        let err = ExperimentReportBuilder::new("")
            .robustness(robustness())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("run_id"));
    }

    #[test]
    fn test_robustness_round_trips_through_report() {
        let report = ExperimentReportBuilder::new("bb-run")
            .robustness(robustness())
            .model("rf")
            .note("explain: unavailable")
            .build()
            .unwrap();
        assert_eq!(report.robustness(), robustness());
        assert_eq!(report.model(), Some("rf"));
        assert_eq!(report.notes().len(), 1);
        assert_eq!(report.schema_version(), SCHEMA_VERSION);
    }
}
