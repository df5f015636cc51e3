//! Baseline classifiers.
//!
//! A [`Trainer`] fits a [`Classifier`] once; the classifier is immutable and
//! shared read-only through `Arc`. Prediction aligns features by column
//! name, so a mutated dataset with dropped columns can still be scored: a
//! feature missing at prediction time, and any missing cell, is imputed with
//! its training mean.

pub mod boosting;
mod cart;
pub mod centroid;
pub mod forest;
pub mod majority;

pub use boosting::{BoostedTrees, BoostingTrainer};
pub use centroid::{CentroidClassifier, CentroidTrainer};
pub use forest::{ForestTrainer, RandomForest};
pub use majority::{MajorityClassifier, MajorityTrainer};

use std::collections::BTreeMap;
use std::sync::Arc;

use bb_config::{ModelConfig, ModelKind};
use bb_data::Dataset;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{actual} labels for {expected} rows")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("feature {0} is not numeric")]
    NonNumericFeature(String),

    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

impl From<ModelError> for bb_common::Error {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Prediction(msg) => bb_common::Error::Prediction(msg),
            other => bb_common::Error::Training(other.to_string()),
        }
    }
}

/// A fitted model.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Model family, e.g. `rf`.
    fn name(&self) -> &str;

    /// Feature columns seen at training time, in training order.
    fn feature_names(&self) -> &[String];

    /// One predicted label per row of `features`.
    fn predict(&self, features: &Dataset) -> Result<Vec<String>, ModelError>;

    /// Impurity-based importance per training feature, for tree models.
    fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        None
    }
}

/// Fits a classifier from a feature table and row-aligned labels.
pub trait Trainer {
    fn fit(&self, features: &Dataset, labels: &[String]) -> Result<Arc<dyn Classifier>, ModelError>;
}

/// Trainer for the configured model family.
pub fn trainer_for(config: &ModelConfig) -> Box<dyn Trainer> {
    match config.kind {
        ModelKind::Rf => Box::new(ForestTrainer {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            seed: config.seed,
        }),
        ModelKind::Xgb => Box::new(BoostingTrainer {
            n_rounds: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            learning_rate: config.learning_rate,
            seed: config.seed,
        }),
        ModelKind::Centroid => Box::new(CentroidTrainer),
        ModelKind::Majority => Box::new(MajorityTrainer),
    }
}

/// Training-time feature layout and per-feature means for imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAligner {
    names: Vec<String>,
    means: Vec<f64>,
}

impl FeatureAligner {
    /// Capture the numeric layout of a training table.
    pub fn fit(features: &Dataset) -> Result<Self, ModelError> {
        let mut names = Vec::with_capacity(features.n_columns());
        let mut means = Vec::with_capacity(features.n_columns());
        for (name, column) in features.iter() {
            let values = column
                .as_numeric()
                .ok_or_else(|| ModelError::NonNumericFeature(name.to_string()))?;
            let mean = bb_math::mean(values);
            names.push(name.to_string());
            means.push(if mean.is_finite() { mean } else { 0.0 });
        }
        Ok(Self { names, means })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Row-major matrix in training column order.
    pub fn matrix(&self, features: &Dataset) -> Result<Vec<Vec<f64>>, ModelError> {
        let n_rows = features.n_rows();
        let mut rows = vec![Vec::with_capacity(self.names.len()); n_rows];
        for (name, &mean) in self.names.iter().zip(&self.means) {
            match features.column(name) {
                None => rows.iter_mut().for_each(|row| row.push(mean)),
                Some(column) => {
                    let values = column
                        .as_numeric()
                        .ok_or_else(|| ModelError::NonNumericFeature(name.clone()))?;
                    for (row, &v) in rows.iter_mut().zip(values) {
                        row.push(if v.is_finite() { v } else { mean });
                    }
                }
            }
        }
        Ok(rows)
    }
}

/// Sorted distinct labels and each row's index into them.
pub(crate) fn encode_labels(labels: &[String]) -> (Vec<String>, Vec<usize>) {
    let classes: Vec<String> = labels
        .iter()
        .cloned()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    let index: BTreeMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let encoded = labels.iter().map(|l| index[l.as_str()]).collect();
    (classes, encoded)
}

/// Index of the largest count; ties go to the lowest index.
pub(crate) fn argmax(counts: &[usize]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn check_training_set(features: &Dataset, labels: &[String]) -> Result<(), ModelError> {
    if labels.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if features.n_columns() > 0 && features.n_rows() != labels.len() {
        return Err(ModelError::LengthMismatch {
            expected: features.n_rows(),
            actual: labels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_data {
    use bb_data::{Column, Dataset};

    /// Two well-separated clusters in two features.
    pub fn blobs(n_per_class: usize) -> (Dataset, Vec<String>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class {
            let jitter = (i % 5) as f64 * 0.1;
            x.push(0.0 + jitter);
            y.push(0.0 - jitter);
            labels.push("a".to_string());
            x.push(10.0 - jitter);
            y.push(10.0 + jitter);
            labels.push("b".to_string());
        }
        let data = Dataset::from_columns(vec![
            ("x".into(), Column::Numeric(x)),
            ("y".into(), Column::Numeric(y)),
        ])
        .unwrap();
        (data, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_data::Column;

    #[test]
    fn test_aligner_imputes_missing_columns_and_cells() {
        let train = Dataset::from_columns(vec![
            ("a".into(), Column::Numeric(vec![1.0, 3.0])),
            ("b".into(), Column::Numeric(vec![10.0, 20.0])),
        ])
        .unwrap();
        let aligner = FeatureAligner::fit(&train).unwrap();

        let test = Dataset::from_columns(vec![
            ("b".into(), Column::Numeric(vec![f64::NAN, 5.0])),
            ("extra".into(), Column::Numeric(vec![0.0, 0.0])),
        ])
        .unwrap();
        let m = aligner.matrix(&test).unwrap();
        assert_eq!(m, vec![vec![2.0, 15.0], vec![2.0, 5.0]]);
    }

    #[test]
    fn test_aligner_rejects_categorical() {
        let train = Dataset::from_columns(vec![(
            "c".into(),
            Column::Categorical(vec![Some("x".into())]),
        )])
        .unwrap();
        assert_eq!(
            FeatureAligner::fit(&train).unwrap_err(),
            ModelError::NonNumericFeature("c".into())
        );
    }

    #[test]
    fn test_encode_labels_sorted() {
        let labels: Vec<String> = ["b", "a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let (classes, encoded) = encode_labels(&labels);
        assert_eq!(classes, vec!["a", "b", "c"]);
        assert_eq!(encoded, vec![1, 0, 1, 2]);
        assert_eq!(argmax(&[2, 3, 3]), 1);
    }

    #[test]
    fn test_trainer_for_each_kind() {
        let (data, labels) = test_data::blobs(10);
        for kind in [ModelKind::Rf, ModelKind::Xgb, ModelKind::Centroid, ModelKind::Majority] {
            let config = ModelConfig {
                kind,
                n_trees: 5,
                ..Default::default()
            };
            let model = trainer_for(&config).fit(&data, &labels).unwrap();
            assert_eq!(model.name(), kind.to_string());
            assert_eq!(model.predict(&data).unwrap().len(), 20);
        }
    }

    #[test]
    fn test_error_mapping() {
        let err: bb_common::Error = ModelError::EmptyTrainingSet.into();
        assert_eq!(err.code(), 1301);
        let err: bb_common::Error = ModelError::Prediction("x".into()).into();
        assert_eq!(err.code(), 1302);
    }
}
