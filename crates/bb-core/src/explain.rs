//! Feature attribution.
//!
//! Attribution is informational: the pipeline records it as a run artifact
//! when it succeeds and logs a warning when it does not.

use std::sync::Arc;
use std::time::Duration;

use bb_data::{Column, Dataset};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Classifier, ModelError};
use crate::mutation::derive_seed;
use crate::timeout::{run_bounded, WorkerError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExplainError {
    #[error("explanation sample is empty")]
    EmptySample,

    #[error("model failed during explanation: {0}")]
    Model(#[from] ModelError),

    #[error("explainer {0}")]
    Worker(#[from] WorkerError),
}

/// Weight of one feature in the model's decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    /// Fraction of predictions that changed when the feature was permuted,
    /// or the normalized impurity decrease for tree models.
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub method: String,
    pub model: String,
    pub sample_size: usize,
    pub repeats: usize,
    /// Sorted by importance, largest first; ties keep column order.
    pub features: Vec<FeatureAttribution>,
    /// Impurity-based importances of tree models, sorted the same way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impurity: Vec<FeatureAttribution>,
}

impl Attribution {
    pub fn top(&self) -> Option<&FeatureAttribution> {
        self.features.first()
    }
}

pub trait Explainer: Send + Sync {
    fn explain(&self, model: &dyn Classifier, sample: &Dataset) -> Result<Attribution, ExplainError>;
}

/// Permutation sensitivity over a seeded row sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PermutationExplainer {
    pub sample_size: usize,
    pub repeats: usize,
    pub seed: u64,
}

impl Default for PermutationExplainer {
    fn default() -> Self {
        Self {
            sample_size: 200,
            repeats: 3,
            seed: 42,
        }
    }
}

impl PermutationExplainer {
    fn sample(&self, data: &Dataset) -> Dataset {
        let n = data.n_rows();
        if n <= self.sample_size {
            return data.clone();
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut rows = index::sample(&mut rng, n, self.sample_size).into_vec();
        rows.sort_unstable();
        data.take_rows(&rows)
    }
}

fn replace_column(data: &Dataset, target: &str, column: Column) -> Result<Dataset, ExplainError> {
    let mut out = Dataset::default();
    let mut column = Some(column);
    for (name, existing) in data.iter() {
        let next = if name == target {
            column.take().unwrap_or_else(|| existing.clone())
        } else {
            existing.clone()
        };
        out.push_column(name, next)
            .map_err(|e| ExplainError::Model(ModelError::Prediction(e.to_string())))?;
    }
    Ok(out)
}

impl Explainer for PermutationExplainer {
    fn explain(&self, model: &dyn Classifier, sample: &Dataset) -> Result<Attribution, ExplainError> {
        let data = self.sample(sample);
        let n = data.n_rows();
        if n == 0 || data.n_columns() == 0 {
            return Err(ExplainError::EmptySample);
        }
        let baseline = model.predict(&data)?;
        let repeats = self.repeats.max(1);

        let mut features = Vec::with_capacity(data.n_columns());
        for (col_idx, name) in data.column_names().iter().enumerate() {
            let Some(column) = data.column(name) else {
                continue;
            };
            let mut changed_total = 0usize;
            for r in 0..repeats {
                let stream = derive_seed(self.seed, (col_idx * repeats + r) as u64);
                let mut rng = StdRng::seed_from_u64(stream);
                let mut order: Vec<usize> = (0..n).collect();
                order.shuffle(&mut rng);
                let permuted = replace_column(&data, name, column.take(&order))?;
                let predictions = model.predict(&permuted)?;
                changed_total += predictions
                    .iter()
                    .zip(&baseline)
                    .filter(|(a, b)| a != b)
                    .count();
            }
            features.push(FeatureAttribution {
                feature: name.clone(),
                importance: changed_total as f64 / (n * repeats) as f64,
            });
        }
        features.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        let mut impurity: Vec<FeatureAttribution> = model
            .feature_importances()
            .unwrap_or_default()
            .into_iter()
            .map(|(feature, importance)| FeatureAttribution { feature, importance })
            .collect();
        impurity.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        Ok(Attribution {
            method: "permutation".to_string(),
            model: model.name().to_string(),
            sample_size: n,
            repeats,
            features,
            impurity,
        })
    }
}

/// Run an explainer on a worker thread, bounded by `timeout`.
pub fn explain_bounded(
    explainer: Arc<dyn Explainer>,
    model: Arc<dyn Classifier>,
    sample: Arc<Dataset>,
    timeout: Duration,
) -> Result<Attribution, ExplainError> {
    match run_bounded("explain", timeout, move || explainer.explain(model.as_ref(), &sample)) {
        Ok(timed) => timed.value,
        Err((err, _)) => Err(err.into()),
    }
}
