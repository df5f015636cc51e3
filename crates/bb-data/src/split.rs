//! Seeded train/test split.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::dataset::LabeledDataset;
use crate::error::DataError;

/// Held-out split of a labeled dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: LabeledDataset,
    pub test: LabeledDataset,
}

/// Shuffle rows with `seed` and hold out `ceil(n × test_size)` of them.
///
/// Both sides must end up non-empty.
pub fn train_test_split(
    data: &LabeledDataset,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit, DataError> {
    let n = data.n_rows();
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DataError::Split { rows: n, test_size });
    }
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DataError::Split { rows: n, test_size });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);
    let (test_idx, train_idx) = indices.split_at(n_test);

    info!(train = train_idx.len(), test = test_idx.len(), seed, "Split data");
    Ok(TrainTestSplit {
        train: data.take_rows(train_idx),
        test: data.take_rows(test_idx),
    })
}
