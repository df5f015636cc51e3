//! Configuration resolution and loading.
//!
//! Resolution order (highest to lowest priority):
//! 1. Explicit CLI flag (`--config`)
//! 2. `BB_CONFIG` environment variable
//! 3. `$XDG_CONFIG_HOME/blackbox_robustness/experiment.{toml,json}`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::experiment::ExperimentConfig;
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_config, ValidationError};

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG_PATH: &str = "BB_CONFIG";

/// Application directory under the XDG config home.
const CONFIG_DIR_NAME: &str = "blackbox_robustness";

/// Candidate file names inside the config directory, in priority order.
const CONFIG_FILENAMES: [&str; 2] = ["experiment.toml", "experiment.json"];

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file path.
    pub config_path: Option<PathBuf>,
}

/// Loaded configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: ExperimentConfig,
    /// Path the config was read from (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    pub snapshot: ConfigSnapshot,
}

/// Load and validate configuration with the standard resolution order.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = resolve_config_path(options)?;

    let Some(path) = path else {
        let config = ExperimentConfig::default();
        validate_config(&config)?;
        return Ok(ResolvedConfig {
            config,
            path: None,
            source,
            snapshot: ConfigSnapshot::defaults_only(),
        });
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::IoError {
        path: path.clone(),
        source,
    })?;
    let config =
        ExperimentConfig::parse_for_path(&path, &content).map_err(|source| ConfigError::ParseError {
            path: path.clone(),
            source,
        })?;
    validate_config(&config)?;

    let snapshot = ConfigSnapshot::new(
        &config.schema_version,
        Some(path.clone()),
        &source,
        Some(&content),
    );
    Ok(ResolvedConfig {
        config,
        path: Some(path),
        source,
        snapshot,
    })
}

/// Resolve which config file to load, if any.
///
/// An explicit path (CLI or environment) that does not exist is an error;
/// XDG files are optional.
pub fn resolve_config_path(
    options: &ConfigOptions,
) -> Result<(Option<PathBuf>, ConfigSource), ConfigError> {
    // 1. CLI argument
    if let Some(path) = &options.config_path {
        return require_exists(path).map(|p| (Some(p), ConfigSource::CliArgument));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        if !env_path.trim().is_empty() {
            let path = PathBuf::from(env_path);
            return require_exists(&path).map(|p| (Some(p), ConfigSource::Environment));
        }
    }

    // 3. XDG config directory
    let dir = xdg_config_dir();
    for name in CONFIG_FILENAMES {
        let path = dir.join(name);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::XdgConfig));
        }
    }

    // 4. Built-in defaults
    Ok((None, ConfigSource::BuiltinDefault))
}

fn require_exists(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// The auditor's directory under the XDG config home.
pub fn xdg_config_dir() -> PathBuf {
    let xdg_config = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
    xdg_config.join(CONFIG_DIR_NAME)
}
