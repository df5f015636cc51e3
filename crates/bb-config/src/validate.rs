//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::experiment::{
    DataConfig, DriftConfig, ExperimentConfig, ExplainConfig, ModelConfig, MutationConfig,
    OutputConfig,
};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message,
    }
}

/// Validate an experiment configuration semantically.
pub fn validate_config(config: &ExperimentConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_data(&config.data)?;
    validate_mutation(&config.mutation)?;
    validate_drift(&config.drift)?;
    validate_model(&config.model)?;
    validate_explain(&config.explain)?;
    validate_output(&config.output)?;

    if config.notify.timeout_ms == 0 {
        return Err(invalid("notify.timeout_ms", "Must be > 0".to_string()));
    }

    Ok(())
}

fn validate_data(data: &DataConfig) -> ValidationResult<()> {
    if !(data.test_size > 0.0 && data.test_size < 1.0) {
        return Err(invalid(
            "data.test_size",
            format!("Must be in (0, 1), got {}", data.test_size),
        ));
    }
    if let Some(label) = &data.label_column {
        if label.trim().is_empty() {
            return Err(invalid("data.label_column", "Must not be empty".to_string()));
        }
    }
    Ok(())
}

/// Validate mutation parameters.
///
/// Noise intensity and drift ratio must be positive and finite; drop ratio
/// must lie in [0, 1].
pub fn validate_mutation(mutation: &MutationConfig) -> ValidationResult<()> {
    validate_positive("mutation.noise_intensity", mutation.noise_intensity)?;
    validate_positive("mutation.drift_ratio", mutation.drift_ratio)?;
    validate_probability("mutation.drop_ratio", mutation.drop_ratio)?;
    Ok(())
}

fn validate_drift(drift: &DriftConfig) -> ValidationResult<()> {
    if drift.backends.is_empty() {
        return Err(invalid(
            "drift.backends",
            "At least one backend is required".to_string(),
        ));
    }
    for (i, name) in drift.backends.iter().enumerate() {
        if drift.backends[..i].contains(name) {
            return Err(invalid(
                "drift.backends",
                format!("Duplicate backend '{}'", name),
            ));
        }
    }
    validate_open_unit("drift.stattest_threshold", drift.stattest_threshold)?;
    validate_open_unit("drift.mmd_threshold", drift.mmd_threshold)?;
    if !(drift.drift_share > 0.0 && drift.drift_share <= 1.0) {
        return Err(invalid(
            "drift.drift_share",
            format!("Must be in (0, 1], got {}", drift.drift_share),
        ));
    }
    if drift.mmd_permutations == 0 {
        return Err(invalid("drift.mmd_permutations", "Must be >= 1".to_string()));
    }
    if drift.mmd_max_samples < 2 {
        return Err(invalid(
            "drift.mmd_max_samples",
            format!("Must be >= 2, got {}", drift.mmd_max_samples),
        ));
    }
    if drift.timeout_ms == 0 {
        return Err(invalid("drift.timeout_ms", "Must be > 0".to_string()));
    }
    Ok(())
}

fn validate_model(model: &ModelConfig) -> ValidationResult<()> {
    if model.n_trees == 0 {
        return Err(invalid("model.n_trees", "Must be >= 1".to_string()));
    }
    if model.max_depth == 0 {
        return Err(invalid("model.max_depth", "Must be >= 1".to_string()));
    }
    if model.min_samples_split < 2 {
        return Err(invalid(
            "model.min_samples_split",
            format!("Must be >= 2, got {}", model.min_samples_split),
        ));
    }
    if !(model.learning_rate.is_finite() && model.learning_rate > 0.0 && model.learning_rate <= 1.0) {
        return Err(invalid(
            "model.learning_rate",
            format!("Must be in (0, 1], got {}", model.learning_rate),
        ));
    }
    Ok(())
}

fn validate_explain(explain: &ExplainConfig) -> ValidationResult<()> {
    if explain.sample_size == 0 {
        return Err(invalid("explain.sample_size", "Must be >= 1".to_string()));
    }
    if explain.repeats == 0 {
        return Err(invalid("explain.repeats", "Must be >= 1".to_string()));
    }
    if explain.timeout_ms == 0 {
        return Err(invalid("explain.timeout_ms", "Must be > 0".to_string()));
    }
    Ok(())
}

fn validate_output(output: &OutputConfig) -> ValidationResult<()> {
    if output.dir.as_os_str().is_empty() {
        return Err(invalid("output.dir", "Must not be empty".to_string()));
    }
    if output.persist_retries > 10 {
        return Err(invalid(
            "output.persist_retries",
            format!("Must be <= 10, got {}", output.persist_retries),
        ));
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("Must be finite and > 0, got {}", value)));
    }
    Ok(())
}

fn validate_probability(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("Must be in [0, 1], got {}", value)));
    }
    Ok(())
}

fn validate_open_unit(field: &str, value: f64) -> ValidationResult<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid(field, format!("Must be in (0, 1), got {}", value)));
    }
    Ok(())
}
