//! Run sinks.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::manifest::{FileEntry, RunManifest, MANIFEST_FILE_NAME};
use crate::record::RunRecord;
use crate::{Result, TrackingError};

/// File name of the rendered markdown report inside a run directory.
pub const REPORT_FILE_NAME: &str = "experiment_report.md";

/// Where a run ended up.
#[derive(Debug, Clone)]
pub struct PersistReceipt {
    pub run_dir: PathBuf,
    pub manifest: RunManifest,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Destination for a finished run.
pub trait RunSink: Send + Sync {
    /// Persist the record and its rendered report.
    fn persist(&self, record: &RunRecord, report_markdown: &str) -> Result<PersistReceipt>;
}

/// Writes each run into `<root>/<run_id>/`.
#[derive(Debug, Clone)]
pub struct FsRunSink {
    root: PathBuf,
    retries: u32,
    retry_delay: Duration,
}

impl FsRunSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            retries: 0,
            retry_delay: Duration::from_millis(100),
        }
    }

    /// Extra attempts after the first failure (transient errors only).
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Base delay between attempts; attempt `n` waits `n × delay`.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn persist_once(&self, record: &RunRecord, report_markdown: &str) -> Result<PersistReceipt> {
        let run_dir = self.root.join(&record.run_id);
        fs::create_dir_all(&run_dir).map_err(|e| TrackingError::io(&run_dir, e))?;

        let mut manifest = RunManifest::new(&record.run_id)
            .with_generator_version(env!("CARGO_PKG_VERSION"));
        manifest.parameters = record.parameters.clone();
        manifest.metrics = record.metrics.clone();

        write_atomic(&run_dir, REPORT_FILE_NAME, report_markdown.as_bytes())?;
        manifest.add_file(FileEntry::for_data(REPORT_FILE_NAME, report_markdown.as_bytes()));

        for artifact in &record.artifacts {
            write_atomic(&run_dir, &artifact.name, &artifact.data)?;
            manifest.add_file(FileEntry::for_data(&artifact.name, &artifact.data));
            debug!(path = %artifact.name, bytes = artifact.data.len(), "Wrote artifact");
        }

        manifest.sort_files();
        write_atomic(&run_dir, MANIFEST_FILE_NAME, manifest.to_json()?.as_bytes())?;

        Ok(PersistReceipt {
            run_dir,
            manifest,
            attempts: 1,
        })
    }
}

impl RunSink for FsRunSink {
    fn persist(&self, record: &RunRecord, report_markdown: &str) -> Result<PersistReceipt> {
        record.validate(&[REPORT_FILE_NAME, MANIFEST_FILE_NAME])?;

        let attempts = self.retries + 1;
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.persist_once(record, report_markdown) {
                Ok(mut receipt) => {
                    receipt.attempts = attempt;
                    info!(
                        run_id = %record.run_id,
                        path = %receipt.run_dir.display(),
                        files = receipt.manifest.file_count(),
                        bytes = receipt.manifest.total_bytes(),
                        attempt,
                        "Run persisted"
                    );
                    return Ok(receipt);
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(run_id = %record.run_id, attempt, error = %e, "Persist attempt failed, retrying");
                    std::thread::sleep(self.retry_delay * attempt);
                    last_error = Some(e);
                }
                Err(e) if e.is_transient() => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());
        Err(TrackingError::RetriesExhausted { attempts, last })
    }
}

/// Write `data` to `dir/name` through a temporary file and a rename.
fn write_atomic(dir: &Path, name: &str, data: &[u8]) -> Result<()> {
    let final_path = dir.join(name);
    let tmp_path = dir.join(format!(".{}.tmp", name));
    fs::write(&tmp_path, data).map_err(|e| TrackingError::io(&tmp_path, e))?;
    if let Err(e) = fs::rename(&tmp_path, &final_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(TrackingError::io(&final_path, e));
    }
    Ok(())
}
