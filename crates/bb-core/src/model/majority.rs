//! Majority-class baseline.

use std::sync::Arc;

use bb_data::Dataset;

use super::{argmax, check_training_set, encode_labels, Classifier, ModelError, Trainer};

/// Always predicts the most frequent training label.
#[derive(Debug, Clone, PartialEq)]
pub struct MajorityClassifier {
    label: String,
    feature_names: Vec<String>,
}

impl MajorityClassifier {
    pub fn new(label: impl Into<String>, feature_names: Vec<String>) -> Self {
        Self {
            label: label.into(),
            feature_names,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Classifier for MajorityClassifier {
    fn name(&self) -> &str {
        "majority"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &Dataset) -> Result<Vec<String>, ModelError> {
        Ok(vec![self.label.clone(); features.n_rows()])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityTrainer;

impl Trainer for MajorityTrainer {
    fn fit(&self, features: &Dataset, labels: &[String]) -> Result<Arc<dyn Classifier>, ModelError> {
        check_training_set(features, labels)?;
        let (classes, encoded) = encode_labels(labels);
        let mut counts = vec![0usize; classes.len()];
        for &c in &encoded {
            counts[c] += 1;
        }
        let label = classes[argmax(&counts)].clone();
        Ok(Arc::new(MajorityClassifier::new(
            label,
            features.column_names().to_vec(),
        )))
    }
}
