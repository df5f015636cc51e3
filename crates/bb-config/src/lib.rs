//! Robustness auditor configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the experiment config (JSON or TOML)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for run tracking

pub mod experiment;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use experiment::{
    DataConfig, DriftConfig, ExperimentConfig, ExplainConfig, ModelConfig, ModelKind,
    MutationConfig, NotifyConfig, OutputConfig,
};
pub use resolve::{load_config, ConfigError, ConfigOptions, ConfigSource, ResolvedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
