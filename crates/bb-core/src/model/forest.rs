//! Bootstrap random forest of CART trees.
//!
//! Each tree is grown on a bootstrap resample with Gini impurity, trying
//! `ceil(sqrt(p))` random features per split. Tree `i` is seeded from the
//! forest seed and `i`, so a forest is reproducible regardless of build order.
//! Prediction is a plain majority vote; ties go to the first class in sorted
//! label order.

use std::sync::Arc;

use bb_data::Dataset;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::cart::{grow, mean_importances, GrowParams, Target, Tree};
use super::{argmax, check_training_set, encode_labels, Classifier, FeatureAligner, ModelError, Trainer};
use crate::mutation::derive_seed;

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

/// Encoded class labels, split on Gini impurity.
struct Classes<'a> {
    labels: &'a [usize],
    n_classes: usize,
}

impl Target for Classes<'_> {
    type Stats = Vec<usize>;
    type Leaf = usize;

    fn empty(&self) -> Vec<usize> {
        vec![0; self.n_classes]
    }

    fn add(&self, counts: &mut Vec<usize>, sample: usize) {
        counts[self.labels[sample]] += 1;
    }

    fn remove(&self, counts: &mut Vec<usize>, sample: usize) {
        counts[self.labels[sample]] -= 1;
    }

    fn cost(&self, counts: &Vec<usize>) -> f64 {
        let total: usize = counts.iter().sum();
        total as f64 * gini(counts, total)
    }

    fn leaf(&self, counts: &Vec<usize>) -> usize {
        argmax(counts)
    }
}

/// Fitted forest.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    aligner: FeatureAligner,
    classes: Vec<String>,
    trees: Vec<Tree<usize>>,
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Mean decrease in Gini impurity per training feature, summing to 1.
    pub fn impurity_importances(&self) -> Vec<f64> {
        mean_importances(&self.trees, self.aligner.names().len())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "rf"
    }

    fn feature_names(&self) -> &[String] {
        self.aligner.names()
    }

    fn predict(&self, features: &Dataset) -> Result<Vec<String>, ModelError> {
        let rows = self.aligner.matrix(features)?;
        let mut votes = vec![0usize; self.classes.len()];
        Ok(rows
            .iter()
            .map(|row| {
                votes.iter_mut().for_each(|v| *v = 0);
                for tree in &self.trees {
                    votes[tree.predict(row)] += 1;
                }
                self.classes[argmax(&votes)].clone()
            })
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        Some(
            self.aligner
                .names()
                .iter()
                .cloned()
                .zip(self.impurity_importances())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForestTrainer {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestTrainer {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 8,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

impl ForestTrainer {
    pub fn fit_forest(&self, features: &Dataset, labels: &[String]) -> Result<RandomForest, ModelError> {
        check_training_set(features, labels)?;
        if self.n_trees == 0 || self.max_depth == 0 {
            return Err(ModelError::InvalidParameter(
                "n_trees and max_depth must be at least 1".to_string(),
            ));
        }
        let aligner = FeatureAligner::fit(features)?;
        let rows = aligner.matrix(features)?;
        let (classes, encoded) = encode_labels(labels);
        let n = encoded.len();
        let n_features = aligner.names().len();
        let max_features = ((n_features as f64).sqrt().ceil() as usize).max(1);

        let target = Classes {
            labels: &encoded,
            n_classes: classes.len(),
        };
        let params = GrowParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features,
        };

        let mut trees = Vec::with_capacity(self.n_trees);
        for t in 0..self.n_trees {
            let mut rng = StdRng::seed_from_u64(derive_seed(self.seed, t as u64));
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            trees.push(grow(&target, &rows, n_features, &bootstrap, params, &mut rng));
        }

        debug!(
            trees = trees.len(),
            classes = classes.len(),
            features = n_features,
            rows = n,
            "Trained random forest"
        );
        Ok(RandomForest {
            aligner,
            classes,
            trees,
        })
    }
}

impl Trainer for ForestTrainer {
    fn fit(&self, features: &Dataset, labels: &[String]) -> Result<Arc<dyn Classifier>, ModelError> {
        Ok(Arc::new(self.fit_forest(features, labels)?))
    }
}
