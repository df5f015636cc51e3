//! What a run hands to the sink.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Result, TrackingError};

/// One file to persist alongside the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name relative to the run directory.
    pub name: String,
    pub data: Vec<u8>,
}

/// Parameters, metrics and artifacts of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub parameters: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub artifacts: Vec<Artifact>,
}

impl RunRecord {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Record a metric. Non-finite values are skipped.
    pub fn add_metric(&mut self, key: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.metrics.insert(key.into(), value);
        }
    }

    pub fn add_bytes(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.artifacts.push(Artifact {
            name: name.into(),
            data,
        });
    }

    /// Add a JSON-serializable value as a pretty-printed artifact.
    pub fn add_json<T: Serialize>(&mut self, name: impl Into<String>, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.add_bytes(name, json.into_bytes());
        Ok(())
    }

    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    /// Check the run id and artifact names can be written safely.
    pub fn validate(&self, reserved: &[&str]) -> Result<()> {
        if !is_plain_name(&self.run_id) {
            return Err(TrackingError::InvalidRunId(self.run_id.clone()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for artifact in &self.artifacts {
            if !is_plain_name(&artifact.name) || reserved.contains(&artifact.name.as_str()) {
                return Err(TrackingError::InvalidArtifact(artifact.name.clone()));
            }
            if !seen.insert(artifact.name.as_str()) {
                return Err(TrackingError::DuplicateArtifact(artifact.name.clone()));
            }
        }
        Ok(())
    }
}

/// A single path component that is not `.`/`..` and not hidden.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_metrics_skipped() {
        let mut record = RunRecord::new("bb-run");
        record.add_metric("a", 1.0);
        record.add_metric("b", f64::NAN);
        record.add_metric("c", f64::INFINITY);
        assert_eq!(record.metrics.len(), 1);
    }

    #[test]
    fn test_validate_names() {
        let mut record = RunRecord::new("bb-run");
        record.add_bytes("data.csv", b"a\n".to_vec());
        assert!(record.validate(&["manifest.json"]).is_ok());

        record.add_bytes("data.csv", Vec::new());
        assert!(matches!(
            record.validate(&[]),
            Err(TrackingError::DuplicateArtifact(_))
        ));

        let mut record = RunRecord::new("bb-run");
        record.add_bytes("../escape", Vec::new());
        assert!(record.validate(&[]).is_err());

        let mut record = RunRecord::new("bb-run");
        record.add_bytes("manifest.json", Vec::new());
        assert!(record.validate(&["manifest.json"]).is_err());

        assert!(RunRecord::new("..").validate(&[]).is_err());
        assert!(RunRecord::new("a/b").validate(&[]).is_err());
    }

    #[test]
    fn test_add_json() {
        let mut record = RunRecord::new("bb-run");
        record
            .add_json("attr.json", &serde_json::json!({"x": 1}))
            .unwrap();
        let data = &record.artifact("attr.json").unwrap().data;
        assert!(String::from_utf8_lossy(data).contains("\"x\": 1"));
    }
}
