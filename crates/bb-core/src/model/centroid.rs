//! Standardized nearest-centroid classifier.

use std::sync::Arc;

use bb_data::Dataset;

use super::{check_training_set, encode_labels, Classifier, FeatureAligner, ModelError, Trainer};

#[derive(Debug, Clone, PartialEq)]
pub struct CentroidClassifier {
    aligner: FeatureAligner,
    scales: Vec<f64>,
    classes: Vec<String>,
    /// One standardized centroid per class.
    centroids: Vec<Vec<f64>>,
}

impl CentroidClassifier {
    fn standardize(&self, row: &mut [f64]) {
        for ((v, mean), scale) in row.iter_mut().zip(self.aligner.means()).zip(&self.scales) {
            *v = (*v - mean) / scale;
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl Classifier for CentroidClassifier {
    fn name(&self) -> &str {
        "centroid"
    }

    fn feature_names(&self) -> &[String] {
        self.aligner.names()
    }

    fn predict(&self, features: &Dataset) -> Result<Vec<String>, ModelError> {
        let rows = self.aligner.matrix(features)?;
        let mut out = Vec::with_capacity(rows.len());
        for mut row in rows {
            self.standardize(&mut row);
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (class, centroid) in self.centroids.iter().enumerate() {
                let dist: f64 = row
                    .iter()
                    .zip(centroid)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                if dist < best_dist {
                    best = class;
                    best_dist = dist;
                }
            }
            out.push(self.classes[best].clone());
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidTrainer;

impl Trainer for CentroidTrainer {
    fn fit(&self, features: &Dataset, labels: &[String]) -> Result<Arc<dyn Classifier>, ModelError> {
        check_training_set(features, labels)?;
        let aligner = FeatureAligner::fit(features)?;
        let n_features = aligner.names().len();

        let scales: Vec<f64> = aligner
            .names()
            .iter()
            .map(|name| {
                let sd = features.numeric(name).map(bb_math::std_dev).unwrap_or(f64::NAN);
                if sd.is_finite() && sd > f64::EPSILON {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        let (classes, encoded) = encode_labels(labels);
        let mut sums = vec![vec![0.0; n_features]; classes.len()];
        let mut counts = vec![0usize; classes.len()];

        let mut model = CentroidClassifier {
            aligner,
            scales,
            classes,
            centroids: Vec::new(),
        };
        for (mut row, &class) in model.aligner.matrix(features)?.into_iter().zip(&encoded) {
            model.standardize(&mut row);
            for (s, v) in sums[class].iter_mut().zip(&row) {
                *s += v;
            }
            counts[class] += 1;
        }
        model.centroids = sums
            .into_iter()
            .zip(&counts)
            .map(|(sum, &n)| sum.into_iter().map(|s| s / n as f64).collect())
            .collect();
        Ok(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_data::blobs;
    use bb_data::Column;

    #[test]
    fn test_separates_blobs() {
        let (data, labels) = blobs(20);
        let model = CentroidTrainer.fit(&data, &labels).unwrap();
        assert_eq!(model.predict(&data).unwrap(), labels);
    }

    #[test]
    fn test_missing_feature_is_imputed() {
        let (data, labels) = blobs(20);
        let model = CentroidTrainer.fit(&data, &labels).unwrap();
        let only_x = data.without_columns(&["y"]).unwrap();
        let preds = model.predict(&only_x).unwrap();
        assert_eq!(preds, labels);
    }

    #[test]
    fn test_constant_feature_does_not_break_scaling() {
        let data = Dataset::from_columns(vec![
            ("x".into(), Column::Numeric(vec![0.0, 1.0, 5.0, 6.0])),
            ("k".into(), Column::Numeric(vec![3.0; 4])),
        ])
        .unwrap();
        let labels: Vec<String> = ["a", "a", "b", "b"].iter().map(|s| s.to_string()).collect();
        let model = CentroidTrainer.fit(&data, &labels).unwrap();
        assert_eq!(model.predict(&data).unwrap(), labels);
    }
}
