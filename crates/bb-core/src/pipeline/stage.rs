//! Per-stage trace of a pipeline run.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::timeout::millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    /// Finished with some non-fatal failures (e.g. one drift backend).
    Partial,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Succeeded => "succeeded",
            StageStatus::Partial => "partial",
            StageStatus::Failed => "failed",
            StageStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome and timing of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A started stage. Finish it exactly once.
pub(crate) struct StageTimer<'a> {
    ctx: &'a LogContext,
    stage: Stage,
    start: Instant,
}

impl<'a> StageTimer<'a> {
    pub(crate) fn start(ctx: &'a LogContext, stage: Stage) -> Self {
        log_event!(ctx, DEBUG, event_names::STAGE_STARTED, stage, "Stage started");
        Self {
            ctx,
            stage,
            start: Instant::now(),
        }
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn finish(self, status: StageStatus, detail: Option<String>) -> StageRecord {
        let duration_ms = millis(self.start.elapsed());
        let status_str = status.as_str();
        match status {
            StageStatus::Succeeded | StageStatus::Partial => log_event!(
                self.ctx,
                INFO,
                event_names::STAGE_FINISHED,
                self.stage,
                "Stage finished",
                status = status_str,
                duration_ms = duration_ms
            ),
            StageStatus::Skipped => log_event!(
                self.ctx,
                DEBUG,
                event_names::STAGE_SKIPPED,
                self.stage,
                "Stage skipped"
            ),
            StageStatus::Failed => log_event!(
                self.ctx,
                WARN,
                event_names::STAGE_FAILED,
                self.stage,
                detail.as_deref().unwrap_or("Stage failed"),
                duration_ms = duration_ms,
                fatal = self.stage.is_fatal()
            ),
        }
        StageRecord {
            stage: self.stage,
            status,
            duration_ms,
            detail,
        }
    }
}
