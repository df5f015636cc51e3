//! Structured event definitions for logging.
//!
//! Every event carries the run id, host id and pipeline stage so JSONL
//! output from one run can be correlated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stages, in execution order after `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Dataset ingestion, preprocessing and split.
    Load,
    /// Baseline model fit.
    Train,
    /// Mutation of the held-out features.
    Mutate,
    /// Drift measurement between reference and mutated features.
    Drift,
    /// Metric computation and degradation scoring.
    Robustness,
    /// Feature attribution.
    Explain,
    /// Writing the run directory.
    Persist,
    /// Post-run notification.
    Notify,
}

impl Stage {
    /// The stages a pipeline run executes, in order.
    pub const PIPELINE: [Stage; 7] = [
        Stage::Load,
        Stage::Train,
        Stage::Mutate,
        Stage::Drift,
        Stage::Robustness,
        Stage::Explain,
        Stage::Persist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Train => "train",
            Stage::Mutate => "mutate",
            Stage::Drift => "drift",
            Stage::Robustness => "robustness",
            Stage::Explain => "explain",
            Stage::Persist => "persist",
            Stage::Notify => "notify",
        }
    }

    /// Whether a failure in this stage ends the run.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Stage::Init | Stage::Load | Stage::Train | Stage::Mutate | Stage::Robustness
        )
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard event names used as tracing targets.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const RUN_FAILED: &str = "run.failed";

    // Stage lifecycle
    pub const STAGE_STARTED: &str = "stage.started";
    pub const STAGE_FINISHED: &str = "stage.finished";
    pub const STAGE_FAILED: &str = "stage.failed";
    pub const STAGE_SKIPPED: &str = "stage.skipped";

    // Stage details
    pub const DATA_LOADED: &str = "load.dataset";
    pub const MODEL_TRAINED: &str = "train.model";
    pub const BASELINE_EVALUATED: &str = "train.baseline";
    pub const MUTATION_APPLIED: &str = "mutate.step";
    pub const DRIFT_BACKEND_FINISHED: &str = "drift.backend_finished";
    pub const DRIFT_BACKEND_FAILED: &str = "drift.backend_failed";
    pub const ROBUSTNESS_SCORED: &str = "robustness.scored";
    pub const EXPLAIN_FAILED: &str = "explain.failed";
    pub const PERSIST_FAILED: &str = "persist.failed";
    pub const NOTIFY_FAILED: &str = "notify.failed";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,
    /// Event name (e.g. "run.started", "stage.finished").
    pub event: String,
    pub run_id: String,
    pub stage: Stage,
    pub host_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        host_id: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            stage,
            host_id: host_id.into(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field. Values that fail to serialize are dropped.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Correlation ids shared by every event of one run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub host_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
        }
    }

    pub fn event(
        &self,
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        LogEvent::new(level, event, &self.run_id, &self.host_id, stage, message)
    }

    pub fn info(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Info, event, stage, message)
    }

    pub fn warn(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Warn, event, stage, message)
    }

    pub fn error(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Error, event, stage, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(
            Level::Info,
            event_names::RUN_STARTED,
            "bb-20260115-143022-a7xq",
            "host-abc",
            Stage::Init,
            "Starting robustness audit",
        )
        .with_field("model", "rf");

        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"run.started""#));
        assert!(json.contains(r#""level":"info""#));
        assert!(json.contains(r#""stage":"init""#));
        assert!(json.contains(r#""run_id":"bb-20260115-143022-a7xq""#));
        assert!(json.contains(r#""model":"rf""#));
    }

    #[test]
    fn test_context_events() {
        let ctx = LogContext::new("bb-run", "host-xyz");
        let event = ctx.warn(event_names::DRIFT_BACKEND_FAILED, Stage::Drift, "mmd timed out");
        assert_eq!(event.level, Level::Warn);
        assert_eq!(event.stage, Stage::Drift);
        assert_eq!(event.host_id, "host-xyz");
    }

    #[test]
    fn test_stage_order_and_fatality() {
        assert_eq!(Stage::PIPELINE[0], Stage::Load);
        assert_eq!(Stage::PIPELINE[6], Stage::Persist);
        assert!(Stage::PIPELINE.windows(2).all(|w| w[0] < w[1]));
        assert!(Stage::Train.is_fatal());
        assert!(!Stage::Drift.is_fatal());
        assert!(!Stage::Explain.is_fatal());
        assert!(!Stage::Persist.is_fatal());
        assert_eq!(Stage::Robustness.to_string(), "robustness");
    }
}
