//! Maximum mean discrepancy with a permutation test.
//!
//! Shared numeric features are standardized with the reference mean and
//! standard deviation, then compared with a Gaussian RBF kernel whose
//! bandwidth is the median pairwise distance of the pooled sample. The
//! p-value is `(1 + #{permuted ≥ observed}) / (1 + permutations)`.

use bb_common::{BackendErrorKind, BackendFailure, DriftPayload, TwoSampleTest};
use bb_data::Dataset;
use bb_math::{mean, median, std_dev};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::DriftBackend;

pub const MMD_BACKEND: &str = "mmd";

#[derive(Debug, Clone, PartialEq)]
pub struct MmdBackend {
    pub permutations: usize,
    /// Rows per side above which the sample is subsampled.
    pub max_samples: usize,
    pub threshold: f64,
    pub seed: u64,
}

impl Default for MmdBackend {
    fn default() -> Self {
        Self {
            permutations: 100,
            max_samples: 500,
            threshold: 0.05,
            seed: 42,
        }
    }
}

/// Row-major standardized feature matrix.
struct Matrix {
    rows: Vec<Vec<f64>>,
}

impl MmdBackend {
    fn shared_features<'a>(reference: &'a Dataset, current: &Dataset) -> Vec<&'a str> {
        reference
            .numeric_column_names()
            .into_iter()
            .filter(|name| current.numeric(name).is_some())
            .collect()
    }

    fn sample_rows(&self, n: usize, salt: u64) -> Vec<usize> {
        if n <= self.max_samples {
            return (0..n).collect();
        }
        let mut rng = StdRng::seed_from_u64(self.seed ^ salt);
        let mut rows = rand::seq::index::sample(&mut rng, n, self.max_samples).into_vec();
        rows.sort_unstable();
        rows
    }

    fn standardized(&self, features: &[&str], reference: &Dataset, current: &Dataset) -> (Matrix, Matrix) {
        let ref_rows = self.sample_rows(reference.n_rows(), 0x5EED_0001);
        let cur_rows = self.sample_rows(current.n_rows(), 0x5EED_0002);
        let mut x = Matrix {
            rows: vec![Vec::with_capacity(features.len()); ref_rows.len()],
        };
        let mut y = Matrix {
            rows: vec![Vec::with_capacity(features.len()); cur_rows.len()],
        };

        for name in features {
            let (Some(r), Some(c)) = (reference.numeric(name), current.numeric(name)) else {
                continue;
            };
            let mu = mean(r);
            let mu = if mu.is_finite() { mu } else { 0.0 };
            let sd = std_dev(r);
            let sd = if sd.is_finite() && sd > f64::EPSILON { sd } else { 1.0 };
            // missing cells sit at the reference mean
            let scale = |v: f64| if v.is_finite() { (v - mu) / sd } else { 0.0 };
            for (out, &row) in x.rows.iter_mut().zip(&ref_rows) {
                out.push(scale(r[row]));
            }
            for (out, &row) in y.rows.iter_mut().zip(&cur_rows) {
                out.push(scale(c[row]));
            }
        }
        (x, y)
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q).powi(2)).sum()
}

/// Biased MMD² for the split given by `is_x` over a pooled kernel matrix.
fn mmd_squared(kernel: &[Vec<f64>], is_x: &[bool], n_x: usize, n_y: usize) -> f64 {
    let (mut xx, mut yy, mut xy) = (0.0, 0.0, 0.0);
    for (i, row) in kernel.iter().enumerate() {
        for (j, &k) in row.iter().enumerate() {
            match (is_x[i], is_x[j]) {
                (true, true) => xx += k,
                (false, false) => yy += k,
                _ => xy += k,
            }
        }
    }
    let (nx, ny) = (n_x as f64, n_y as f64);
    xx / (nx * nx) + yy / (ny * ny) - xy / (nx * ny)
}

impl DriftBackend for MmdBackend {
    fn name(&self) -> &str {
        MMD_BACKEND
    }

    fn detect(&self, reference: &Dataset, current: &Dataset) -> Result<DriftPayload, BackendFailure> {
        let features = Self::shared_features(reference, current);
        if features.is_empty() {
            return Err(BackendFailure::new(
                BackendErrorKind::NoSharedFeatures,
                "no numeric feature present in both datasets",
            ));
        }
        if reference.n_rows() < 2 || current.n_rows() < 2 {
            return Err(BackendFailure::new(
                BackendErrorKind::InsufficientData,
                format!(
                    "need at least 2 rows per side, got {} and {}",
                    reference.n_rows(),
                    current.n_rows()
                ),
            ));
        }

        let (x, y) = self.standardized(&features, reference, current);
        let (n_x, n_y) = (x.rows.len(), y.rows.len());
        let pooled: Vec<&Vec<f64>> = x.rows.iter().chain(y.rows.iter()).collect();
        let n = pooled.len();

        let mut distances = vec![vec![0.0; n]; n];
        let mut off_diagonal = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                let d = squared_distance(pooled[i], pooled[j]);
                distances[i][j] = d;
                distances[j][i] = d;
                off_diagonal.push(d);
            }
        }

        let median_sq = median(&off_diagonal);
        let bandwidth = if median_sq.is_finite() && median_sq > 0.0 {
            median_sq.sqrt()
        } else {
            1.0
        };
        let gamma = 1.0 / (2.0 * bandwidth * bandwidth);
        let kernel: Vec<Vec<f64>> = distances
            .iter()
            .map(|row| row.iter().map(|d| (-gamma * d).exp()).collect())
            .collect();

        let mut labels: Vec<bool> = (0..n).map(|i| i < n_x).collect();
        let observed = mmd_squared(&kernel, &labels, n_x, n_y);
        if !observed.is_finite() {
            return Err(BackendFailure::new(
                BackendErrorKind::Numerical,
                "MMD statistic is not finite",
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut at_least = 0usize;
        for _ in 0..self.permutations {
            labels.shuffle(&mut rng);
            // tolerance absorbs summation-order noise on ties
            if mmd_squared(&kernel, &labels, n_x, n_y) >= observed - 1e-12 {
                at_least += 1;
            }
        }
        let p_value = (1 + at_least) as f64 / (1 + self.permutations) as f64;

        Ok(DriftPayload::TwoSample(TwoSampleTest {
            method: "mmd_rbf".to_string(),
            statistic: observed.max(0.0),
            p_value,
            threshold: self.threshold,
            permutations: self.permutations,
            bandwidth,
            n_reference: n_x,
            n_current: n_y,
            n_features: features.len(),
            drifted: p_value < self.threshold,
        }))
    }
}
