//! Run manifest types and serialization.
//!
//! The manifest is the source of truth for a run directory:
//! - Run metadata (schema version, timestamps, run id)
//! - Parameters and metrics logged for the run
//! - File listing with SHA-256 checksums and sizes

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Result, TrackingError};

/// Current manifest schema version.
pub const MANIFEST_SCHEMA_VERSION: &str = "1.0.0";

/// Manifest file name within the run directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Manifest describing one persisted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Manifest format version.
    pub schema_version: String,

    /// Run this directory belongs to.
    pub run_id: String,

    /// When the manifest was written.
    pub created_at: DateTime<Utc>,

    /// Version of the tool that wrote the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_version: Option<String>,

    /// Run parameters (model type, dataset, config snapshot, ...).
    pub parameters: BTreeMap<String, String>,

    /// Numeric run metrics.
    pub metrics: BTreeMap<String, f64>,

    /// Files in the run directory with checksums.
    pub files: Vec<FileEntry>,
}

impl RunManifest {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            run_id: run_id.into(),
            created_at: Utc::now(),
            generator_version: None,
            parameters: BTreeMap::new(),
            metrics: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    pub fn with_generator_version(mut self, version: impl Into<String>) -> Self {
        self.generator_version = Some(version.into());
        self
    }

    pub fn add_file(&mut self, entry: FileEntry) {
        self.files.push(entry);
    }

    /// Total size of all listed files in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Sort files for deterministic ordering.
    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Validate the manifest structure.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != MANIFEST_SCHEMA_VERSION {
            return Err(TrackingError::UnsupportedVersion {
                version: self.schema_version.clone(),
                supported: MANIFEST_SCHEMA_VERSION.to_string(),
            });
        }
        if self.run_id.is_empty() {
            return Err(TrackingError::InvalidRunId(self.run_id.clone()));
        }
        for file in &self.files {
            if file.path.is_empty() {
                return Err(TrackingError::InvalidArtifact(file.path.clone()));
            }
            if file.sha256.len() != 64 {
                return Err(TrackingError::ChecksumMismatch {
                    path: file.path.clone(),
                    expected: "64 hex characters".to_string(),
                    actual: file.sha256.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// File entry in the manifest with checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the run directory.
    pub path: String,

    /// SHA-256 checksum (64 hex characters).
    pub sha256: String,

    /// Size in bytes.
    pub bytes: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileEntry {
    /// Entry for `data` stored at `path`, MIME type guessed from the extension.
    pub fn for_data(path: impl Into<String>, data: &[u8]) -> Self {
        let path = path.into();
        let mime_type = mime_for(&path).map(str::to_string);
        Self {
            sha256: Self::compute_checksum(data),
            bytes: data.len() as u64,
            path,
            mime_type,
        }
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    pub fn verify(&self, data: &[u8]) -> bool {
        data.len() as u64 == self.bytes && Self::compute_checksum(data) == self.sha256
    }
}

fn mime_for(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
    match ext {
        "json" => Some("application/json"),
        "md" => Some("text/markdown"),
        "csv" => Some("text/csv"),
        "parquet" => Some("application/vnd.apache.parquet"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_of_known_input() {
        assert_eq!(
            FileEntry::compute_checksum(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_entry_for_data() {
        let entry = FileEntry::for_data("report.json", b"{}");
        assert_eq!(entry.bytes, 2);
        assert_eq!(entry.mime_type.as_deref(), Some("application/json"));
        assert!(entry.verify(b"{}"));
        assert!(!entry.verify(b"[]"));
        assert_eq!(FileEntry::for_data("blob", b"x").mime_type, None);
    }

    #[test]
    fn test_sort_and_totals() {
        let mut manifest = RunManifest::new("bb-run");
        manifest.add_file(FileEntry::for_data("z.md", b"abc"));
        manifest.add_file(FileEntry::for_data("a.json", b"{}"));
        manifest.sort_files();
        assert_eq!(manifest.files[0].path, "a.json");
        assert_eq!(manifest.total_bytes(), 5);
        assert!(manifest.find_file("z.md").is_some());
    }

    #[test]
    fn test_validate() {
        let mut manifest = RunManifest::new("bb-run");
        manifest.add_file(FileEntry::for_data("a.json", b"{}"));
        assert!(manifest.validate().is_ok());

        manifest.files[0].sha256 = "short".into();
        assert!(manifest.validate().is_err());

        let mut old = RunManifest::new("bb-run");
        old.schema_version = "0.9.0".into();
        assert!(matches!(
            old.validate(),
            Err(TrackingError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut manifest = RunManifest::new("bb-run").with_generator_version("0.1.0");
        manifest.parameters.insert("model_type".into(), "rf".into());
        manifest.metrics.insert("reference.accuracy".into(), 0.9);
        let parsed = RunManifest::from_json(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }
}
