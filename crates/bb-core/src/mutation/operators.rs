//! The three mutation operators.

use bb_data::Dataset;
use bb_math::box_muller;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::MutationError;

/// One seeded perturbation of a feature table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationOperator {
    /// Zero-mean Gaussian noise with sd `intensity` on every numeric cell.
    Noise { intensity: f64 },
    /// Remove `round(n_columns × ratio)` columns, keeping at least one.
    Drop { ratio: f64 },
    /// Per-cell Gaussian offset with sd `ratio` on every numeric cell.
    Shift { ratio: f64 },
}

impl MutationOperator {
    pub fn name(&self) -> &'static str {
        match self {
            MutationOperator::Noise { .. } => "noise",
            MutationOperator::Drop { .. } => "drop",
            MutationOperator::Shift { .. } => "shift",
        }
    }

    /// Check the parameter without touching any data.
    pub fn validate(&self) -> Result<(), MutationError> {
        match *self {
            MutationOperator::Noise { intensity } => positive("noise_intensity", intensity),
            MutationOperator::Shift { ratio } => positive("drift_ratio", ratio),
            MutationOperator::Drop { ratio } => {
                if ratio.is_finite() && (0.0..=1.0).contains(&ratio) {
                    Ok(())
                } else {
                    Err(MutationError::invalid(
                        "drop_ratio",
                        format!("must be in [0, 1], got {}", ratio),
                    ))
                }
            }
        }
    }

    /// Apply to `dataset`, returning a new dataset.
    pub fn apply(&self, dataset: &Dataset, seed: u64) -> Result<Dataset, MutationError> {
        self.validate()?;
        match *self {
            MutationOperator::Noise { intensity } => Ok(add_gaussian(dataset, intensity, seed)),
            MutationOperator::Shift { ratio } => Ok(add_gaussian(dataset, ratio, seed)),
            MutationOperator::Drop { ratio } => drop_features(dataset, ratio, seed),
        }
    }
}

impl std::fmt::Display for MutationOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationOperator::Noise { intensity } => write!(f, "noise(intensity={})", intensity),
            MutationOperator::Drop { ratio } => write!(f, "drop(ratio={})", ratio),
            MutationOperator::Shift { ratio } => write!(f, "shift(ratio={})", ratio),
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), MutationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MutationError::invalid(
            name,
            format!("must be positive and finite, got {}", value),
        ))
    }
}

/// Standard normal draws from a seeded generator, two per Box-Muller pair.
struct GaussianStream {
    rng: StdRng,
    spare: Option<f64>,
}

impl GaussianStream {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            spare: None,
        }
    }

    fn next(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        // (0, 1] keeps the logarithm finite
        let u1 = 1.0 - self.rng.random::<f64>();
        let u2 = self.rng.random::<f64>();
        let (z0, z1) = box_muller(u1, u2);
        self.spare = Some(z1);
        z0
    }
}

fn add_gaussian(dataset: &Dataset, sd: f64, seed: u64) -> Dataset {
    let mut normal = GaussianStream::new(seed);
    dataset.map_numeric(|_, value| value + sd * normal.next())
}

fn drop_features(dataset: &Dataset, ratio: f64, seed: u64) -> Result<Dataset, MutationError> {
    let n = dataset.n_columns();
    if n == 0 {
        return Err(MutationError::invalid(
            "drop_ratio",
            "dataset has no columns to drop".to_string(),
        ));
    }
    let n_drop = drop_count(n, ratio);
    if n_drop == 0 {
        return Ok(dataset.clone());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let names = dataset.column_names();
    let mut chosen: Vec<usize> = rand::seq::index::sample(&mut rng, n, n_drop).into_vec();
    chosen.sort_unstable();
    let drop: Vec<&str> = chosen.iter().map(|&i| names[i].as_str()).collect();
    tracing::debug!(dropped = ?drop, "Dropping feature columns");
    Ok(dataset.without_columns(&drop)?)
}

/// Columns removed for `ratio` out of `n`: rounded, at most `n - 1`.
pub fn drop_count(n_columns: usize, ratio: f64) -> usize {
    if n_columns == 0 {
        return 0;
    }
    let raw = (n_columns as f64 * ratio).round();
    (raw.max(0.0) as usize).min(n_columns - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_data::Column;

    fn numeric(n_cols: usize, n_rows: usize) -> Dataset {
        Dataset::from_columns(
            (0..n_cols)
                .map(|c| {
                    (
                        format!("f{}", c),
                        Column::Numeric((0..n_rows).map(|r| (r * n_cols + c) as f64).collect()),
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_drop_count() {
        assert_eq!(drop_count(5, 0.1), 1);
        assert_eq!(drop_count(5, 0.0), 0);
        assert_eq!(drop_count(5, 1.0), 4);
        assert_eq!(drop_count(1, 1.0), 0);
        assert_eq!(drop_count(10, 0.25), 3);
        assert_eq!(drop_count(0, 0.5), 0);
    }

    #[test]
    fn test_noise_changes_numeric_only() {
        let mut data = numeric(2, 50);
        data.push_column(
            "city",
            Column::Categorical(vec![Some("x".to_string()); 50]),
        )
        .unwrap();
        let out = MutationOperator::Noise { intensity: 0.5 }.apply(&data, 7).unwrap();
        assert_eq!(out.n_rows(), 50);
        assert_eq!(out.column("city"), data.column("city"));
        assert_ne!(out.numeric("f0"), data.numeric("f0"));
    }

    #[test]
    fn test_noise_is_roughly_calibrated() {
        let data = Dataset::from_columns(vec![("x".into(), Column::Numeric(vec![0.0; 4000]))]).unwrap();
        let out = MutationOperator::Noise { intensity: 2.0 }.apply(&data, 11).unwrap();
        let values = out.numeric("x").unwrap();
        let mean = bb_math::mean(values);
        let sd = bb_math::std_dev(values);
        assert!(mean.abs() < 0.15, "mean = {}", mean);
        assert!((sd - 2.0).abs() < 0.15, "sd = {}", sd);
    }

    #[test]
    fn test_input_is_not_modified() {
        let data = numeric(3, 10);
        let before = data.clone();
        let _ = MutationOperator::Shift { ratio: 1.0 }.apply(&data, 1).unwrap();
        let _ = MutationOperator::Drop { ratio: 0.5 }.apply(&data, 1).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn test_drop_is_seeded() {
        let data = numeric(10, 4);
        let op = MutationOperator::Drop { ratio: 0.3 };
        let a = op.apply(&data, 99).unwrap();
        let b = op.apply(&data, 99).unwrap();
        assert_eq!(a.column_names(), b.column_names());
        assert_eq!(a.n_columns(), 7);
        // kept columns preserve their relative order
        let positions: Vec<usize> = a
            .column_names()
            .iter()
            .map(|n| data.index_of(n).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_invalid_parameters() {
        let data = numeric(2, 3);
        for op in [
            MutationOperator::Noise { intensity: 0.0 },
            MutationOperator::Noise { intensity: f64::NAN },
            MutationOperator::Shift { ratio: -0.1 },
            MutationOperator::Drop { ratio: 1.5 },
            MutationOperator::Drop { ratio: -0.01 },
        ] {
            assert!(
                matches!(op.apply(&data, 0), Err(MutationError::InvalidParameter { .. })),
                "{} should be rejected",
                op
            );
        }
    }

    #[test]
    fn test_drop_on_empty_dataset() {
        let err = MutationOperator::Drop { ratio: 0.5 }
            .apply(&Dataset::default(), 0)
            .unwrap_err();
        assert!(matches!(err, MutationError::InvalidParameter { .. }));
    }
}
