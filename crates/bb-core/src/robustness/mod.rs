//! Robustness evaluation.
//!
//! The same fitted classifier is scored on reference features and on their
//! mutated counterpart, both against the original labels; the model is never
//! refit. Degradation is the signed percentage drop per metric.

pub mod metrics;

pub use metrics::{
    accuracy, classification_metrics, metrics_from_matrix, weighted_scores, ConfusionMatrix,
    WeightedScores,
};

use bb_common::{DegradationSet, MetricSet, RobustnessReport};
use bb_data::Dataset;
use thiserror::Error;

use crate::model::{Classifier, ModelError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RobustnessError {
    #[error("{actual} values for {expected} rows")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("prediction failed: {0}")]
    Model(#[from] ModelError),
}

impl From<RobustnessError> for bb_common::Error {
    fn from(err: RobustnessError) -> Self {
        match err {
            RobustnessError::LengthMismatch { expected, actual } => {
                bb_common::Error::LengthMismatch { expected, actual }
            }
            RobustnessError::Model(e) => bb_common::Error::Evaluation(e.to_string()),
        }
    }
}

fn score(
    classifier: &dyn Classifier,
    features: &Dataset,
    labels: &[String],
) -> Result<MetricSet, RobustnessError> {
    if features.n_columns() > 0 && features.n_rows() != labels.len() {
        return Err(RobustnessError::LengthMismatch {
            expected: features.n_rows(),
            actual: labels.len(),
        });
    }
    let predictions = classifier.predict(features)?;
    classification_metrics(labels, &predictions)
}

/// Score `classifier` on reference and mutated data.
pub fn evaluate(
    classifier: &dyn Classifier,
    x_ref: &Dataset,
    y_ref: &[String],
    x_mut: &Dataset,
    y_mut: &[String],
) -> Result<(MetricSet, MetricSet), RobustnessError> {
    let reference = score(classifier, x_ref, y_ref)?;
    let mutated = score(classifier, x_mut, y_mut)?;
    Ok((reference, mutated))
}

/// `(reference - mutated) / reference * 100` for each reference metric.
///
/// A zero reference scores 0. A metric missing from `mutated` is scored as
/// if its mutated value were 0.
pub fn score_degradation(reference: &MetricSet, mutated: &MetricSet) -> DegradationSet {
    reference
        .iter()
        .map(|(metric, r)| {
            let m = mutated.get(metric).unwrap_or(0.0);
            let pct = if r == 0.0 { 0.0 } else { (r - m) / r * 100.0 };
            (metric, pct)
        })
        .collect()
}

pub fn build_report(reference: &MetricSet, mutated: &MetricSet) -> RobustnessReport {
    RobustnessReport {
        reference_metrics: reference.clone(),
        mutated_metrics: mutated.clone(),
        degradation: score_degradation(reference, mutated),
    }
}
