//! Gradient-boosted trees with a softmax objective.
//!
//! Scores start at the log class priors. Each round fits one regression tree
//! per class to the negative gradient of the multinomial log loss, with a
//! Newton step in every leaf, and adds it scaled by the learning rate. Every
//! feature is tried at every split; the seed only orders candidate features.

use std::sync::Arc;

use bb_data::Dataset;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::cart::{grow, mean_importances, GrowParams, Target, Tree};
use super::{check_training_set, encode_labels, Classifier, FeatureAligner, ModelError, Trainer};
use crate::mutation::derive_seed;

/// Smallest hessian sum used as a leaf denominator.
const MIN_HESSIAN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Default)]
struct GradStats {
    n: usize,
    sum_g: f64,
    sum_g2: f64,
    sum_h: f64,
}

/// Residuals of one class for one round.
struct Gradients<'a> {
    grad: &'a [f64],
    hess: &'a [f64],
    /// `(K - 1) / K` shrinkage of the multiclass Newton step.
    scale: f64,
}

impl Target for Gradients<'_> {
    type Stats = GradStats;
    type Leaf = f64;

    fn empty(&self) -> GradStats {
        GradStats::default()
    }

    fn add(&self, stats: &mut GradStats, sample: usize) {
        let g = self.grad[sample];
        stats.n += 1;
        stats.sum_g += g;
        stats.sum_g2 += g * g;
        stats.sum_h += self.hess[sample];
    }

    fn remove(&self, stats: &mut GradStats, sample: usize) {
        let g = self.grad[sample];
        stats.n -= 1;
        stats.sum_g -= g;
        stats.sum_g2 -= g * g;
        stats.sum_h -= self.hess[sample];
    }

    fn cost(&self, stats: &GradStats) -> f64 {
        if stats.n == 0 {
            return 0.0;
        }
        (stats.sum_g2 - stats.sum_g * stats.sum_g / stats.n as f64).max(0.0)
    }

    fn leaf(&self, stats: &GradStats) -> f64 {
        self.scale * stats.sum_g / stats.sum_h.max(MIN_HESSIAN)
    }
}

fn softmax_into(scores: &[f64], out: &mut [f64]) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for (o, &s) in out.iter_mut().zip(scores) {
        *o = (s - max).exp();
        total += *o;
    }
    out.iter_mut().for_each(|o| *o /= total);
}

/// Index of the largest score; ties go to the lowest index.
fn argmax_score(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate() {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

/// Fitted boosted ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedTrees {
    aligner: FeatureAligner,
    classes: Vec<String>,
    base_scores: Vec<f64>,
    learning_rate: f64,
    /// One tree per class per round.
    rounds: Vec<Vec<Tree<f64>>>,
}

impl BoostedTrees {
    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn scores(&self, row: &[f64]) -> Vec<f64> {
        let mut scores = self.base_scores.clone();
        for round in &self.rounds {
            for (score, tree) in scores.iter_mut().zip(round) {
                *score += self.learning_rate * tree.predict(row);
            }
        }
        scores
    }
}

impl Classifier for BoostedTrees {
    fn name(&self) -> &str {
        "xgb"
    }

    fn feature_names(&self) -> &[String] {
        self.aligner.names()
    }

    fn predict(&self, features: &Dataset) -> Result<Vec<String>, ModelError> {
        let rows = self.aligner.matrix(features)?;
        Ok(rows
            .iter()
            .map(|row| self.classes[argmax_score(&self.scores(row))].clone())
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = mean_importances(self.rounds.iter().flatten(), self.aligner.names().len());
        Some(self.aligner.names().iter().cloned().zip(importances).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoostingTrainer {
    pub n_rounds: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for BoostingTrainer {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            max_depth: 6,
            min_samples_split: 2,
            learning_rate: 0.3,
            seed: 42,
        }
    }
}

impl BoostingTrainer {
    pub fn fit_boosted(&self, features: &Dataset, labels: &[String]) -> Result<BoostedTrees, ModelError> {
        check_training_set(features, labels)?;
        if self.n_rounds == 0 || self.max_depth == 0 {
            return Err(ModelError::InvalidParameter(
                "n_rounds and max_depth must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }

        let aligner = FeatureAligner::fit(features)?;
        let rows = aligner.matrix(features)?;
        let (classes, encoded) = encode_labels(labels);
        let n = encoded.len();
        let k = classes.len();
        let n_features = aligner.names().len();

        let mut counts = vec![0usize; k];
        encoded.iter().for_each(|&c| counts[c] += 1);
        let base_scores: Vec<f64> = counts.iter().map(|&c| (c as f64 / n as f64).ln()).collect();

        let params = GrowParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: n_features,
        };
        let samples: Vec<usize> = (0..n).collect();
        let mut scores = vec![base_scores.clone(); n];
        let mut probs = vec![vec![0.0; k]; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut rounds = Vec::with_capacity(self.n_rounds);

        // A single class needs no trees.
        let n_rounds = if k < 2 { 0 } else { self.n_rounds };
        for m in 0..n_rounds {
            for (s, p) in scores.iter().zip(probs.iter_mut()) {
                softmax_into(s, p);
            }
            let mut round = Vec::with_capacity(k);
            for class in 0..k {
                for i in 0..n {
                    let p = probs[i][class];
                    let y = if encoded[i] == class { 1.0 } else { 0.0 };
                    grad[i] = y - p;
                    hess[i] = p * (1.0 - p);
                }
                let target = Gradients {
                    grad: &grad,
                    hess: &hess,
                    scale: (k - 1) as f64 / k as f64,
                };
                let mut rng = StdRng::seed_from_u64(derive_seed(self.seed, (m * k + class) as u64));
                round.push(grow(&target, &rows, n_features, &samples, params, &mut rng));
            }
            for (row, s) in rows.iter().zip(scores.iter_mut()) {
                for (score, tree) in s.iter_mut().zip(&round) {
                    *score += self.learning_rate * tree.predict(row);
                }
            }
            rounds.push(round);
        }

        debug!(
            rounds = rounds.len(),
            classes = k,
            features = n_features,
            rows = n,
            "Trained boosted trees"
        );
        Ok(BoostedTrees {
            aligner,
            classes,
            base_scores,
            learning_rate: self.learning_rate,
            rounds,
        })
    }
}

impl Trainer for BoostingTrainer {
    fn fit(&self, features: &Dataset, labels: &[String]) -> Result<Arc<dyn Classifier>, ModelError> {
        Ok(Arc::new(self.fit_boosted(features, labels)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_data::blobs;
    use bb_data::Column;

    fn small() -> BoostingTrainer {
        BoostingTrainer {
            n_rounds: 10,
            max_depth: 3,
            ..Default::default()
        }
    }

    fn threshold_data() -> (Dataset, Vec<String>) {
        let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let z: Vec<f64> = (0..40).map(|i| ((i * 7) % 5) as f64).collect();
        let labels = x
            .iter()
            .map(|&v| if v < 20.0 { "low" } else { "high" }.to_string())
            .collect();
        let data = Dataset::from_columns(vec![
            ("x".into(), Column::Numeric(x)),
            ("z".into(), Column::Numeric(z)),
        ])
        .unwrap();
        (data, labels)
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let mut out = vec![0.0; 3];
        softmax_into(&[1000.0, 1000.0, 0.0], &mut out);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((out[0] - 0.5).abs() < 1e-12);
        assert_eq!(argmax_score(&[0.1, 0.3, 0.3]), 1);
    }

    #[test]
    fn test_fits_separable_data() {
        let (data, labels) = blobs(25);
        let model = small().fit_boosted(&data, &labels).unwrap();
        assert_eq!(model.n_rounds(), 10);
        assert_eq!(model.name(), "xgb");
        assert_eq!(model.predict(&data).unwrap(), labels);
    }

    #[test]
    fn test_learns_threshold_on_one_feature() {
        let (data, labels) = threshold_data();
        let model = small().fit_boosted(&data, &labels).unwrap();

        let unseen = Dataset::from_columns(vec![("x".into(), Column::Numeric(vec![2.0, 37.0]))]).unwrap();
        assert_eq!(model.predict(&unseen).unwrap(), vec!["low", "high"]);

        let importances = model.feature_importances().unwrap();
        assert_eq!(importances[0].0, "x");
        assert!(importances[0].1 > 0.99);
    }

    #[test]
    fn test_three_classes() {
        let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let labels: Vec<String> = x
            .iter()
            .map(|&v| ["a", "b", "c"][(v / 10.0) as usize].to_string())
            .collect();
        let data = Dataset::from_columns(vec![("x".into(), Column::Numeric(x))]).unwrap();
        let model = small().fit_boosted(&data, &labels).unwrap();
        assert_eq!(model.classes(), ["a", "b", "c"]);
        assert_eq!(model.predict(&data).unwrap(), labels);
    }

    #[test]
    fn test_single_class_predicts_it() {
        let (data, _) = blobs(4);
        let labels = vec!["only".to_string(); 8];
        let model = small().fit_boosted(&data, &labels).unwrap();
        assert_eq!(model.n_rounds(), 0);
        assert!(model.predict(&data).unwrap().iter().all(|l| l == "only"));
    }

    #[test]
    fn test_same_seed_same_model() {
        let (data, labels) = blobs(15);
        let a = small().fit_boosted(&data, &labels).unwrap();
        let b = small().fit_boosted(&data, &labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_parameters() {
        let (data, labels) = blobs(3);
        for trainer in [
            BoostingTrainer {
                n_rounds: 0,
                ..Default::default()
            },
            BoostingTrainer {
                learning_rate: 0.0,
                ..Default::default()
            },
            BoostingTrainer {
                learning_rate: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                trainer.fit_boosted(&data, &labels),
                Err(ModelError::InvalidParameter(_))
            ));
        }
    }
}
