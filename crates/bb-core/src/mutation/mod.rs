//! Mutation engine.
//!
//! Operators are pure: they take a `&Dataset`, a parameter and a seed, and
//! return a new dataset. Rows are never removed; only [`MutationOperator::Drop`]
//! removes columns, and it always leaves at least one.
//!
//! A [`MutationPlan`] is an explicit ordered list of steps. Each step owns its
//! seed, derived from the plan's base seed and the step index, so steps never
//! share a random stream and reordering one step does not reseed the others.

pub mod operators;

pub use operators::{drop_count, MutationOperator};

use bb_config::MutationConfig;
use bb_data::{DataError, Dataset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("invalid mutation parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("mutation failed: {0}")]
    Data(#[from] DataError),
}

impl MutationError {
    pub(crate) fn invalid(name: &str, message: String) -> Self {
        MutationError::InvalidParameter {
            name: name.to_string(),
            message,
        }
    }
}

impl From<MutationError> for bb_common::Error {
    fn from(err: MutationError) -> Self {
        match err {
            MutationError::InvalidParameter { name, message } => {
                bb_common::Error::InvalidParameter { name, message }
            }
            MutationError::Data(e) => bb_common::Error::Internal(e.to_string()),
        }
    }
}

/// An operator bound to its own seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationStep {
    pub operator: MutationOperator,
    pub seed: u64,
}

/// Ordered composition of mutation steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationPlan {
    base_seed: u64,
    steps: Vec<MutationStep>,
}

impl MutationPlan {
    pub fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            steps: Vec::new(),
        }
    }

    /// Noise, then feature drop, then distribution shift.
    pub fn default_composition(params: &MutationConfig, seed: u64) -> Self {
        Self::new(seed)
            .then(MutationOperator::Noise {
                intensity: params.noise_intensity,
            })
            .then(MutationOperator::Drop {
                ratio: params.drop_ratio,
            })
            .then(MutationOperator::Shift {
                ratio: params.drift_ratio,
            })
    }

    /// Append a step seeded from the base seed and its position.
    pub fn then(mut self, operator: MutationOperator) -> Self {
        let seed = derive_seed(self.base_seed, self.steps.len() as u64);
        self.steps.push(MutationStep { operator, seed });
        self
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn steps(&self) -> &[MutationStep] {
        &self.steps
    }

    /// Validate every step before any data is touched.
    pub fn validate(&self) -> Result<(), MutationError> {
        self.steps.iter().try_for_each(|s| s.operator.validate())
    }

    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset, MutationError> {
        self.validate()?;
        compose(dataset, &self.steps)
    }
}

/// Apply one operator.
pub fn apply(dataset: &Dataset, operator: &MutationOperator, seed: u64) -> Result<Dataset, MutationError> {
    operator.apply(dataset, seed)
}

/// Apply `steps` in order, each consuming the previous output.
///
/// An empty step list returns a copy of the input.
pub fn compose(dataset: &Dataset, steps: &[MutationStep]) -> Result<Dataset, MutationError> {
    let mut current = dataset.clone();
    for (idx, step) in steps.iter().enumerate() {
        let next = step.operator.apply(&current, step.seed)?;
        debug!(
            step = idx,
            operator = %step.operator,
            seed = step.seed,
            columns_before = current.n_columns(),
            columns_after = next.n_columns(),
            rows = next.n_rows(),
            "Applied mutation step"
        );
        current = next;
    }
    Ok(current)
}

/// SplitMix64 mix of a base seed and a step index.
pub fn derive_seed(base: u64, index: u64) -> u64 {
    let mut x = base ^ (index << 1);
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
