//! One misbehaving drift backend must never take down the comparison.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use bb_common::{BackendErrorKind, BackendFailure, DriftPayload};
use bb_core::drift::{DriftBackend, DriftDetector, FeatureReportBackend, MmdBackend};
use bb_core::mutation::MutationOperator;
use bb_data::Dataset;

struct Panics;

impl DriftBackend for Panics {
    fn name(&self) -> &str {
        "panics"
    }

    fn detect(&self, _: &Dataset, _: &Dataset) -> Result<DriftPayload, BackendFailure> {
        panic!("backend blew up")
    }
}

struct Sleeps(Duration);

impl DriftBackend for Sleeps {
    fn name(&self) -> &str {
        "sleeps"
    }

    fn detect(&self, reference: &Dataset, current: &Dataset) -> Result<DriftPayload, BackendFailure> {
        std::thread::sleep(self.0);
        FeatureReportBackend::default().detect(reference, current)
    }
}

struct Rejects;

impl DriftBackend for Rejects {
    fn name(&self) -> &str {
        "rejects"
    }

    fn detect(&self, _: &Dataset, _: &Dataset) -> Result<DriftPayload, BackendFailure> {
        Err(BackendFailure::new(BackendErrorKind::Numerical, "statistic is NaN"))
    }
}

fn pair() -> (Dataset, Dataset) {
    let reference = common::numeric_dataset(80, 4);
    let current = MutationOperator::Shift { ratio: 0.5 }
        .apply(&reference, 7)
        .unwrap();
    (reference, current)
}

#[test]
fn failures_are_recorded_per_backend() {
    let (reference, current) = pair();
    let detector = DriftDetector::new(Duration::from_millis(300))
        .with_backend(Arc::new(FeatureReportBackend::default()))
        .with_backend(Arc::new(Panics))
        .with_backend(Arc::new(Sleeps(Duration::from_secs(3))))
        .with_backend(Arc::new(Rejects));

    let started = Instant::now();
    let cmp = detector.compare(&reference, &current);
    assert!(started.elapsed() < Duration::from_secs(3));

    assert_eq!(cmp.len(), 4);
    assert_eq!(cmp.succeeded(), 1);
    assert_eq!(cmp.failed(), 3);
    assert!(cmp.is_partial());

    let kind = |name: &str| cmp.get(name).and_then(|r| r.failure()).map(|f| f.kind);
    assert_eq!(kind("panics"), Some(BackendErrorKind::Panicked));
    assert_eq!(kind("sleeps"), Some(BackendErrorKind::Timeout));
    assert_eq!(kind("rejects"), Some(BackendErrorKind::Numerical));
    assert!(cmp.get("feature_report").unwrap().is_success());
}

#[test]
fn slow_backend_within_bound_succeeds() {
    let (reference, current) = pair();
    let detector = DriftDetector::new(Duration::from_secs(5))
        .with_backend(Arc::new(Sleeps(Duration::from_millis(20))));
    let cmp = detector.compare(&reference, &current);
    assert_eq!(cmp.succeeded(), 1);
    assert!(!cmp.is_partial());
}

#[test]
fn both_builtin_backends_see_a_large_shift() {
    let (reference, current) = pair();
    let detector = DriftDetector::new(Duration::from_secs(30))
        .with_backend(Arc::new(FeatureReportBackend::default()))
        .with_backend(Arc::new(MmdBackend {
            permutations: 50,
            ..Default::default()
        }));
    let cmp = detector.compare(&reference, &current);
    assert_eq!(cmp.succeeded(), 2);
    for result in cmp.iter() {
        let score = result.score().unwrap();
        assert!(score.is_finite() && score >= 0.0, "{}: {}", result.backend, score);
    }
}
