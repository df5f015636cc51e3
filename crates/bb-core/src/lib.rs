//! Black-box robustness auditor core library.
//!
//! This library provides the experiment pipeline:
//! - Mutation engine (noise, feature drop, distribution shift)
//! - Drift detection with isolated, interchangeable backends
//! - Baseline models and robustness scoring
//! - Permutation feature attribution
//! - Orchestration, logging and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod drift;
pub mod exit_codes;
pub mod explain;
pub mod logging;
pub mod model;
pub mod mutation;
pub mod notify;
pub mod pipeline;
pub mod robustness;
pub mod timeout;

pub use exit_codes::ExitCode;
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
