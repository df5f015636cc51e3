//! Experiment configuration types.
//!
//! Every section defaults sensibly, so an empty file (or no file at all)
//! describes the standard experiment: Gaussian noise 0.05, feature drop 0.1,
//! distribution shift 0.1, seed 42, a random forest baseline, both drift
//! backends, and a permutation explainer over at most 200 rows.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::validate::ValidationError;

/// Top-level experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub schema_version: String,
    pub data: DataConfig,
    pub mutation: MutationConfig,
    pub drift: DriftConfig,
    pub model: ModelConfig,
    pub explain: ExplainConfig,
    pub output: OutputConfig,
    pub notify: NotifyConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            data: DataConfig::default(),
            mutation: MutationConfig::default(),
            drift: DriftConfig::default(),
            model: ModelConfig::default(),
            explain: ExplainConfig::default(),
            output: OutputConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Dataset split settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Label column name. Defaults to the last column of the file.
    pub label_column: Option<String>,
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,
    pub split_seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            label_column: None,
            test_size: 0.2,
            split_seed: 42,
        }
    }
}

/// Mutation operator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Standard deviation of additive Gaussian noise.
    pub noise_intensity: f64,
    /// Fraction of feature columns removed.
    pub drop_ratio: f64,
    /// Standard deviation of the distribution-shift offset.
    pub drift_ratio: f64,
    /// Base seed; each step derives its own.
    pub seed: u64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            noise_intensity: 0.05,
            drop_ratio: 0.1,
            drift_ratio: 0.1,
            seed: 42,
        }
    }
}

/// Drift detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Registered backend names to run, in order.
    pub backends: Vec<String>,
    /// Per-feature p-value below which a feature counts as drifted.
    pub stattest_threshold: f64,
    /// Share of drifted features at which the dataset counts as drifted.
    pub drift_share: f64,
    pub mmd_permutations: usize,
    pub mmd_max_samples: usize,
    /// p-value below which the MMD test reports drift.
    pub mmd_threshold: f64,
    pub seed: u64,
    /// Wall-clock bound per backend.
    pub timeout_ms: u64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            backends: vec!["feature_report".to_string(), "mmd".to_string()],
            stattest_threshold: 0.05,
            drift_share: 0.5,
            mmd_permutations: 100,
            mmd_max_samples: 500,
            mmd_threshold: 0.05,
            seed: 42,
            timeout_ms: 30_000,
        }
    }
}

/// Built-in baseline classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Bootstrap random forest
    #[default]
    Rf,
    /// Gradient-boosted trees
    Xgb,
    /// Standardized nearest centroid
    Centroid,
    /// Majority class
    Majority,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Rf => write!(f, "rf"),
            ModelKind::Xgb => write!(f, "xgb"),
            ModelKind::Centroid => write!(f, "centroid"),
            ModelKind::Majority => write!(f, "majority"),
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rf" | "random_forest" => Ok(ModelKind::Rf),
            "xgb" | "boosted" | "gradient_boosting" => Ok(ModelKind::Xgb),
            "centroid" => Ok(ModelKind::Centroid),
            "majority" => Ok(ModelKind::Majority),
            other => Err(ValidationError::InvalidValue {
                field: "model.kind".to_string(),
                message: format!("unknown model '{}', expected rf, xgb, centroid or majority", other),
            }),
        }
    }
}

/// Baseline model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Trees in the forest, or boosting rounds for `xgb`.
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Shrinkage per boosting round. Ignored by other models.
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Rf,
            n_trees: 50,
            max_depth: 8,
            min_samples_split: 2,
            learning_rate: 0.3,
            seed: 42,
        }
    }
}

/// Permutation-sensitivity explainer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub enabled: bool,
    /// Maximum number of rows sampled for attribution.
    pub sample_size: usize,
    pub repeats: usize,
    pub seed: u64,
    pub timeout_ms: u64,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_size: 200,
            repeats: 3,
            seed: 42,
            timeout_ms: 30_000,
        }
    }
}

/// Run artifact output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; each run gets its own subdirectory.
    pub dir: PathBuf,
    /// Extra persistence attempts after the first failure.
    pub persist_retries: u32,
    /// Write the mutated feature table alongside the report.
    pub write_dataset: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("runs"),
            persist_retries: 2,
            write_dataset: true,
        }
    }
}

/// Post-run notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    /// HTTP endpoint for the run note. Logged only when unset.
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            timeout_ms: 5_000,
        }
    }
}

impl ExperimentConfig {
    /// Parse from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse from a TOML string.
    pub fn parse_toml(text: &str) -> Result<Self, ValidationError> {
        toml::from_str(text).map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Parse by file extension (`.toml`, otherwise JSON).
    pub fn parse_for_path(path: &std::path::Path, content: &str) -> Result<Self, ValidationError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::parse_toml(content),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::parse_json(content),
            Some(ext) => Err(ValidationError::ParseError(format!(
                "Unsupported config extension .{} (expected .toml or .json)",
                ext
            ))),
            None => Self::parse_json(content),
        }
    }

    /// Load from a JSON or TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse_for_path(path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExperimentConfig::default();
        assert_eq!(config.mutation.noise_intensity, 0.05);
        assert_eq!(config.mutation.drop_ratio, 0.1);
        assert_eq!(config.mutation.drift_ratio, 0.1);
        assert_eq!(config.mutation.seed, 42);
        assert_eq!(config.data.test_size, 0.2);
        assert_eq!(config.model.kind, ModelKind::Rf);
        assert_eq!(config.explain.sample_size, 200);
        assert_eq!(config.output.persist_retries, 2);
        assert_eq!(config.drift.backends, vec!["feature_report", "mmd"]);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ExperimentConfig::parse_toml(
            r#"
            [mutation]
            noise_intensity = 0.2

            [model]
            kind = "majority"
            "#,
        )
        .unwrap();
        assert_eq!(config.mutation.noise_intensity, 0.2);
        assert_eq!(config.mutation.drop_ratio, 0.1);
        assert_eq!(config.model.kind, ModelKind::Majority);
        assert_eq!(config.schema_version, crate::CONFIG_SCHEMA_VERSION);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = ExperimentConfig::parse_json(r#"{"drift": {"backends": ["mmd"]}}"#).unwrap();
        assert_eq!(config.drift.backends, vec!["mmd"]);
        assert_eq!(config.drift.timeout_ms, 30_000);
    }

    #[test]
    fn test_bad_extension_rejected() {
        let err = ExperimentConfig::parse_for_path(std::path::Path::new("x.yaml"), "").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_model_kind_from_str() {
        assert_eq!("RF".parse::<ModelKind>().unwrap(), ModelKind::Rf);
        assert_eq!("centroid".parse::<ModelKind>().unwrap(), ModelKind::Centroid);
        assert_eq!("xgb".parse::<ModelKind>().unwrap(), ModelKind::Xgb);
        assert_eq!("gradient_boosting".parse::<ModelKind>().unwrap(), ModelKind::Xgb);
        assert!("svm".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_boosted_model_from_toml() {
        let config = ExperimentConfig::parse_toml(
            r#"
            [model]
            kind = "xgb"
            learning_rate = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(config.model.kind, ModelKind::Xgb);
        assert_eq!(config.model.kind.to_string(), "xgb");
        assert_eq!(config.model.learning_rate, 0.1);
        assert_eq!(config.model.n_trees, 50);
    }
}
