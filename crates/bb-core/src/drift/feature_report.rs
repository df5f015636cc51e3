//! Per-feature multi-test drift report.
//!
//! Numeric features: two-sample Kolmogorov-Smirnov plus a normalized
//! 1-Wasserstein distance. Categorical features: chi-square homogeneity over
//! the union of observed categories. A feature drifts when its p-value falls
//! below `stattest_threshold`; the dataset drifts when the drifted share
//! reaches `drift_share`.

use std::collections::BTreeMap;

use bb_common::{
    BackendErrorKind, BackendFailure, DriftPayload, FeatureDrift, FeatureDriftReport, FeatureKind,
    StatTest,
};
use bb_data::{Column, Dataset};
use bb_math::{chi_square_homogeneity, ks_two_sample, wasserstein_normed};
use tracing::debug;

use super::DriftBackend;

pub const FEATURE_REPORT_BACKEND: &str = "feature_report";

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureReportBackend {
    pub stattest_threshold: f64,
    pub drift_share: f64,
}

impl Default for FeatureReportBackend {
    fn default() -> Self {
        Self {
            stattest_threshold: 0.05,
            drift_share: 0.5,
        }
    }
}

impl FeatureReportBackend {
    pub fn new(stattest_threshold: f64, drift_share: f64) -> Self {
        Self {
            stattest_threshold,
            drift_share,
        }
    }

    fn test_feature(&self, name: &str, reference: &Column, current: &Column) -> Option<FeatureDrift> {
        match (reference.as_numeric(), current.as_numeric()) {
            (Some(r), Some(c)) => {
                let ks = ks_two_sample(r, c)?;
                Some(FeatureDrift {
                    feature: name.to_string(),
                    kind: FeatureKind::Numeric,
                    test: StatTest::Ks,
                    statistic: ks.statistic,
                    p_value: ks.p_value,
                    wasserstein: Some(wasserstein_normed(r, c)),
                    drifted: ks.p_value < self.stattest_threshold,
                })
            }
            _ => {
                let (ref_counts, cur_counts) = category_counts(reference, current);
                let chi = chi_square_homogeneity(&ref_counts, &cur_counts)?;
                Some(FeatureDrift {
                    feature: name.to_string(),
                    kind: FeatureKind::Categorical,
                    test: StatTest::ChiSquare,
                    statistic: chi.statistic,
                    p_value: chi.p_value,
                    wasserstein: None,
                    drifted: chi.p_value < self.stattest_threshold,
                })
            }
        }
    }
}

/// Aligned category counts over the union of non-missing values.
fn category_counts(reference: &Column, current: &Column) -> (Vec<f64>, Vec<f64>) {
    let mut counts: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for row in 0..reference.len() {
        if let Some(v) = reference.value_string(row) {
            counts.entry(v).or_default().0 += 1.0;
        }
    }
    for row in 0..current.len() {
        if let Some(v) = current.value_string(row) {
            counts.entry(v).or_default().1 += 1.0;
        }
    }
    counts.values().map(|&(r, c)| (r, c)).unzip()
}

impl DriftBackend for FeatureReportBackend {
    fn name(&self) -> &str {
        FEATURE_REPORT_BACKEND
    }

    fn detect(&self, reference: &Dataset, current: &Dataset) -> Result<DriftPayload, BackendFailure> {
        if reference.n_rows() == 0 || current.n_rows() == 0 {
            return Err(BackendFailure::new(
                BackendErrorKind::InsufficientData,
                format!(
                    "need rows on both sides, got {} reference and {} current",
                    reference.n_rows(),
                    current.n_rows()
                ),
            ));
        }

        let mut features = Vec::new();
        let mut missing_features = Vec::new();
        for (name, ref_col) in reference.iter() {
            let Some(cur_col) = current.column(name) else {
                missing_features.push(name.to_string());
                continue;
            };
            match self.test_feature(name, ref_col, cur_col) {
                Some(result) => {
                    if !result.statistic.is_finite() || !result.p_value.is_finite() {
                        return Err(BackendFailure::new(
                            BackendErrorKind::Numerical,
                            format!("non-finite statistic for feature {}", name),
                        ));
                    }
                    features.push(result);
                }
                None => debug!(feature = name, "Feature has no usable values, skipped"),
            }
        }

        if features.is_empty() {
            let kind = if missing_features.len() == reference.n_columns() {
                BackendErrorKind::NoSharedFeatures
            } else {
                BackendErrorKind::InsufficientData
            };
            return Err(BackendFailure::new(kind, "no feature could be tested"));
        }

        let drifted_count = features.iter().filter(|f| f.drifted).count();
        let share_drifted = drifted_count as f64 / features.len() as f64;
        Ok(DriftPayload::FeatureReport(FeatureDriftReport {
            features,
            missing_features,
            drifted_count,
            share_drifted,
            stattest_threshold: self.stattest_threshold,
            drift_share: self.drift_share,
            dataset_drift: share_drifted >= self.drift_share,
        }))
    }
}
