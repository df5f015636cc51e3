//! Reading persisted runs back with integrity verification.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::manifest::{FileEntry, RunManifest, MANIFEST_FILE_NAME};
use crate::sink::REPORT_FILE_NAME;
use crate::{Result, TrackingError};

/// Reader for a run directory written by [`crate::FsRunSink`].
#[derive(Debug, Clone)]
pub struct RunReader {
    run_dir: PathBuf,
    manifest: RunManifest,
}

impl RunReader {
    /// Open a run directory and validate its manifest.
    pub fn open(run_dir: &Path) -> Result<Self> {
        let manifest_path = run_dir.join(MANIFEST_FILE_NAME);
        if !manifest_path.is_file() {
            return Err(TrackingError::MissingFile(MANIFEST_FILE_NAME.to_string()));
        }
        let json =
            fs::read_to_string(&manifest_path).map_err(|e| TrackingError::io(&manifest_path, e))?;
        let manifest = RunManifest::from_json(&json)?;
        manifest.validate()?;

        info!(
            run_id = %manifest.run_id,
            files = manifest.file_count(),
            "Run opened"
        );
        Ok(Self {
            run_dir: run_dir.to_path_buf(),
            manifest,
        })
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    pub fn run_id(&self) -> &str {
        &self.manifest.run_id
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.manifest.files
    }

    /// Read a listed file and check its checksum.
    pub fn read_verified(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self
            .manifest
            .find_file(path)
            .ok_or_else(|| TrackingError::MissingFile(path.to_string()))?;
        let full = self.run_dir.join(path);
        if !full.is_file() {
            return Err(TrackingError::MissingFile(path.to_string()));
        }
        let data = fs::read(&full).map_err(|e| TrackingError::io(&full, e))?;
        if !entry.verify(&data) {
            return Err(TrackingError::ChecksumMismatch {
                path: path.to_string(),
                expected: entry.sha256.clone(),
                actual: FileEntry::compute_checksum(&data),
            });
        }
        debug!(path, bytes = data.len(), "File verified");
        Ok(data)
    }

    /// Verify every listed file.
    pub fn verify_all(&self) -> Result<()> {
        for entry in &self.manifest.files {
            self.read_verified(&entry.path)?;
        }
        Ok(())
    }

    /// The rendered markdown report, verified.
    pub fn read_report(&self) -> Result<String> {
        let data = self.read_verified(REPORT_FILE_NAME)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
