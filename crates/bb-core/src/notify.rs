//! Post-run notes.
//!
//! The pipeline calls the configured [`Notifier`] once, after Persist.
//! Failures are logged and never change the run's outcome.

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification endpoint rejected the note: {0}")]
    Rejected(String),

    #[error("notification transport failed: {0}")]
    Transport(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, note: &str) -> Result<(), NotifyError>;
}

/// Writes the note to the log at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, note: &str) -> Result<(), NotifyError> {
        info!(note, "Run note");
        Ok(())
    }
}

/// POSTs `{"note": ...}` as JSON to an HTTP endpoint.
#[cfg(feature = "notify")]
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    endpoint: String,
    timeout: std::time::Duration,
}

#[cfg(feature = "notify")]
impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[cfg(feature = "notify")]
impl Notifier for HttpNotifier {
    fn notify(&self, note: &str) -> Result<(), NotifyError> {
        match ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .send_json(serde_json::json!({ "note": note }))
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => Err(NotifyError::Rejected(format!("HTTP {}", code))),
            Err(e) => Err(NotifyError::Transport(e.to_string())),
        }
    }
}

/// Notifier selected by configuration.
///
/// An endpoint without the `notify` feature falls back to the log notifier.
pub fn notifier_for(config: &bb_config::NotifyConfig) -> Box<dyn Notifier> {
    match &config.endpoint {
        #[cfg(feature = "notify")]
        Some(endpoint) => Box::new(HttpNotifier::new(
            endpoint.clone(),
            std::time::Duration::from_millis(config.timeout_ms),
        )),
        #[cfg(not(feature = "notify"))]
        Some(endpoint) => {
            tracing::warn!(endpoint = %endpoint, "HTTP notifications need the `notify` feature; logging instead");
            Box::new(LogNotifier)
        }
        None => Box::new(LogNotifier),
    }
}

/// One-line summary of a run, used as the note body.
pub fn run_note(report: &bb_report::ExperimentReport) -> String {
    let worst = report
        .degradation()
        .worst()
        .map(|(metric, pct)| format!("worst degradation {} {:.2}%", metric, pct))
        .unwrap_or_else(|| "no degradation computed".to_string());
    let drift = report.drift();
    format!(
        "run {}: {}; drift backends {}/{} succeeded",
        report.run_id(),
        worst,
        drift.succeeded(),
        drift.len()
    )
}
