//! Configuration snapshots for run tracking and reproducibility.
//!
//! A snapshot captures where the configuration came from and a hash of its
//! content, so a persisted run can be traced back to the exact file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::resolve::ConfigSource;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the config was loaded from (None for built-in defaults).
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Where the config was found.
    pub source: String,

    /// SHA-256 of the file content (None for built-in defaults).
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl ConfigSnapshot {
    pub fn new(
        schema_version: &str,
        path: Option<PathBuf>,
        source: &ConfigSource,
        content: Option<&str>,
    ) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: schema_version.to_string(),
            path,
            source: source.to_string(),
            content_hash: content.map(hash_content),
        }
    }

    /// Snapshot for a run that used only built-in defaults.
    pub fn defaults_only() -> Self {
        Self::new(
            crate::CONFIG_SCHEMA_VERSION,
            None,
            &ConfigSource::BuiltinDefault,
            None,
        )
    }
}

/// Hex-encoded SHA-256 of a string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_content_known_value() {
        assert_eq!(
            hash_content(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_defaults_only() {
        let snap = ConfigSnapshot::defaults_only();
        assert!(snap.path.is_none());
        assert!(snap.content_hash.is_none());
        assert_eq!(snap.source, "builtin default");
        assert_eq!(snap.schema_version, crate::CONFIG_SCHEMA_VERSION);
    }
}
