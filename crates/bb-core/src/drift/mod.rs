//! Drift detection.
//!
//! Backends implement [`DriftBackend`]. The [`DriftDetector`] runs each one
//! on its own worker thread under a wall-clock bound and turns every error,
//! panic or timeout into a [`DriftOutcome::Failed`](bb_common::DriftOutcome)
//! result, so comparing two datasets never fails as a whole.
//!
//! Adding a backend means implementing the trait and registering its name in
//! [`backend_for_name`].

pub mod feature_report;
pub mod mmd;

pub use feature_report::{FeatureReportBackend, FEATURE_REPORT_BACKEND};
pub use mmd::{MmdBackend, MMD_BACKEND};

use std::sync::Arc;
use std::time::Duration;

use bb_common::{
    BackendErrorKind, BackendFailure, DriftComparison, DriftPayload, DriftResult,
};
use bb_config::DriftConfig;
use bb_data::Dataset;
use tracing::{debug, warn};

use crate::logging::event_names;
use crate::timeout::{millis, run_bounded, WorkerError};

/// One interchangeable drift statistic.
pub trait DriftBackend: Send + Sync {
    /// Stable identifier used in reports and configuration.
    fn name(&self) -> &str;

    /// Measure drift of `current` against `reference`.
    fn detect(&self, reference: &Dataset, current: &Dataset) -> Result<DriftPayload, BackendFailure>;
}

/// Names accepted in `drift.backends`.
pub const KNOWN_BACKENDS: [&str; 2] = [FEATURE_REPORT_BACKEND, MMD_BACKEND];

/// Build a registered backend from configuration.
pub fn backend_for_name(name: &str, config: &DriftConfig) -> Option<Arc<dyn DriftBackend>> {
    match name {
        FEATURE_REPORT_BACKEND => Some(Arc::new(FeatureReportBackend::new(
            config.stattest_threshold,
            config.drift_share,
        ))),
        MMD_BACKEND => Some(Arc::new(MmdBackend {
            permutations: config.mmd_permutations,
            max_samples: config.mmd_max_samples,
            threshold: config.mmd_threshold,
            seed: config.seed,
        })),
        _ => None,
    }
}

/// Runs a set of backends with failure isolation.
#[derive(Clone)]
pub struct DriftDetector {
    backends: Vec<Arc<dyn DriftBackend>>,
    timeout: Duration,
}

impl std::fmt::Debug for DriftDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftDetector")
            .field("backends", &self.backend_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DriftDetector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            backends: Vec::new(),
            timeout,
        }
    }

    /// Detector with every backend listed in `config.backends`.
    ///
    /// An unknown name is a configuration error.
    pub fn from_config(config: &DriftConfig) -> Result<Self, bb_common::Error> {
        let mut detector = Self::new(Duration::from_millis(config.timeout_ms));
        for name in &config.backends {
            let backend = backend_for_name(name, config).ok_or_else(|| {
                bb_common::Error::Configuration(format!(
                    "unknown drift backend '{}', expected one of {}",
                    name,
                    KNOWN_BACKENDS.join(", ")
                ))
            })?;
            detector = detector.with_backend(backend);
        }
        Ok(detector)
    }

    pub fn with_backend(mut self, backend: Arc<dyn DriftBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one backend under the detector's time bound.
    pub fn detect(
        &self,
        reference: &Arc<Dataset>,
        current: &Arc<Dataset>,
        backend: &Arc<dyn DriftBackend>,
    ) -> DriftResult {
        let name = backend.name().to_string();
        let worker_backend = Arc::clone(backend);
        let (r, c) = (Arc::clone(reference), Arc::clone(current));

        match run_bounded(&name, self.timeout, move || worker_backend.detect(&r, &c)) {
            Ok(timed) => {
                let elapsed_ms = millis(timed.elapsed);
                match timed.value {
                    Ok(payload) => DriftResult::success(name, payload, elapsed_ms),
                    Err(failure) => DriftResult::failed(name, failure, elapsed_ms),
                }
            }
            Err((err, elapsed)) => {
                let kind = match err {
                    WorkerError::Timeout(_) => BackendErrorKind::Timeout,
                    WorkerError::Panicked(_) => BackendErrorKind::Panicked,
                    WorkerError::Spawn(_) => BackendErrorKind::Internal,
                };
                DriftResult::failed(name, BackendFailure::new(kind, err.to_string()), millis(elapsed))
            }
        }
    }

    /// Run every backend. Failures are logged at WARN and recorded, never returned.
    pub fn compare(&self, reference: &Dataset, current: &Dataset) -> DriftComparison {
        let reference = Arc::new(reference.clone());
        let current = Arc::new(current.clone());
        let mut comparison = DriftComparison::new();

        for backend in &self.backends {
            let result = self.detect(&reference, &current, backend);
            match result.failure() {
                Some(failure) => warn!(
                    target: event_names::DRIFT_BACKEND_FAILED,
                    backend = %result.backend,
                    kind = %failure.kind,
                    elapsed_ms = result.elapsed_ms,
                    error = %failure.message,
                    "Drift backend failed"
                ),
                None => debug!(
                    target: event_names::DRIFT_BACKEND_FINISHED,
                    backend = %result.backend,
                    score = result.score().unwrap_or(f64::NAN),
                    elapsed_ms = result.elapsed_ms,
                    "Drift backend finished"
                ),
            }
            comparison.insert(result);
        }
        comparison
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_default_backends() {
        let detector = DriftDetector::from_config(&DriftConfig::default()).unwrap();
        assert_eq!(detector.backend_names(), vec!["feature_report", "mmd"]);
        assert_eq!(detector.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let config = DriftConfig {
            backends: vec!["psi".to_string()],
            ..Default::default()
        };
        let err = DriftDetector::from_config(&config).unwrap_err();
        assert!(matches!(err, bb_common::Error::Configuration(_)));
        assert!(err.to_string().contains("psi"));
    }

    #[test]
    fn test_empty_detector_gives_empty_comparison() {
        let data = Dataset::default();
        let cmp = DriftDetector::new(Duration::from_secs(1)).compare(&data, &data);
        assert!(cmp.is_empty());
    }
}
