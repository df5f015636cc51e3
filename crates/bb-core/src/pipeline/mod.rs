//! Experiment orchestration.
//!
//! Stages run strictly in order: Load, Train, Mutate, Drift, Robustness,
//! Explain, Persist, followed by an optional notification.
//!
//! # Failure policy
//!
//! - Load, Train, Mutate and Robustness are fatal: the run stops with
//!   [`PipelineError::Fatal`].
//! - Drift never fails as a whole; backend failures are recorded per backend.
//! - Explain failures are logged and the attribution is omitted.
//! - Persist failures are reported in [`PipelineOutcome::persistence`]; the
//!   in-memory report is still returned.
//! - Notification failures are logged and ignored.

pub mod stage;

pub use stage::{StageRecord, StageStatus};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bb_common::{DriftComparison, RobustnessReport};
use bb_config::{ConfigSnapshot, ExperimentConfig};
use bb_data::{Dataset, LabeledDataset, TrainTestSplit};
use bb_report::{render_json, render_markdown, ExperimentReport, ExperimentReportBuilder};
use bb_tracking::{FsRunSink, RunRecord, RunSink, MANIFEST_FILE_NAME, REPORT_FILE_NAME};
use serde::Serialize;
use thiserror::Error;

use crate::drift::DriftDetector;
use crate::explain::{explain_bounded, Attribution, Explainer, PermutationExplainer};
use crate::log_event;
use crate::logging::{event_names, generate_run_id, get_host_id, LogContext, Stage};
use crate::model::{trainer_for, Classifier, Trainer};
use crate::mutation::MutationPlan;
use crate::notify::{notifier_for, run_note, Notifier};
use crate::robustness::{self, ConfusionMatrix};
use stage::StageTimer;

/// Artifact names written next to the report.
pub const REPORT_JSON_FILE: &str = "report.json";
pub const ATTRIBUTION_FILE: &str = "feature_attribution.json";
pub const MUTATED_FEATURES_FILE: &str = "mutated_features.csv";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    Fatal {
        stage: Stage,
        source: bb_common::Error,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Fatal { stage, .. } => *stage,
        }
    }

    pub fn error(&self) -> &bb_common::Error {
        match self {
            PipelineError::Fatal { source, .. } => source,
        }
    }
}

/// Where the run's artifacts went.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Persisted { run_dir: PathBuf, attempts: u32 },
    Failed { message: String },
    Skipped,
}

impl PersistenceStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, PersistenceStatus::Failed { .. })
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: String,
    pub report: ExperimentReport,
    #[serde(skip)]
    pub markdown: String,
    pub stages: Vec<StageRecord>,
    pub persistence: PersistenceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
    /// Mutated held-out features, as scored by the Robustness stage.
    #[serde(skip)]
    pub mutated_features: Dataset,
}

impl PipelineOutcome {
    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// No drift backend failed and persistence did not fail.
    pub fn is_clean(&self) -> bool {
        !self.persistence.is_failed() && self.report.drift().failed() == 0
    }
}

/// Runs one experiment with a fixed configuration and collaborators.
pub struct Pipeline {
    config: ExperimentConfig,
    snapshot: Option<ConfigSnapshot>,
    ctx: LogContext,
    trainer: Box<dyn Trainer>,
    detector: DriftDetector,
    explainer: Option<Arc<dyn Explainer>>,
    sink: Option<Box<dyn RunSink>>,
    notifier: Option<Box<dyn Notifier>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("run_id", &self.ctx.run_id)
            .field("model", &self.config.model.kind)
            .field("detector", &self.detector)
            .field("explain", &self.explainer.is_some())
            .field("persist", &self.sink.is_some())
            .field("notify", &self.notifier.is_some())
            .finish()
    }
}

impl Pipeline {
    /// Build a pipeline from configuration.
    ///
    /// Fails only on configuration errors, such as an unknown drift backend.
    pub fn new(config: ExperimentConfig) -> Result<Self, bb_common::Error> {
        let detector = DriftDetector::from_config(&config.drift)?;
        let explainer: Option<Arc<dyn Explainer>> = config.explain.enabled.then(|| {
            Arc::new(PermutationExplainer {
                sample_size: config.explain.sample_size,
                repeats: config.explain.repeats,
                seed: config.explain.seed,
            }) as Arc<dyn Explainer>
        });
        let sink: Box<dyn RunSink> = Box::new(
            FsRunSink::new(config.output.dir.clone()).with_retries(config.output.persist_retries),
        );
        let notifier = config.notify.enabled.then(|| notifier_for(&config.notify));

        Ok(Self {
            trainer: trainer_for(&config.model),
            ctx: LogContext::new(generate_run_id(), get_host_id()),
            snapshot: None,
            detector,
            explainer,
            sink: Some(sink),
            notifier,
            config,
        })
    }

    pub fn with_context(mut self, ctx: LogContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_snapshot(mut self, snapshot: ConfigSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_trainer(mut self, trainer: Box<dyn Trainer>) -> Self {
        self.trainer = trainer;
        self
    }

    pub fn with_detector(mut self, detector: DriftDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_explainer(mut self, explainer: Option<Arc<dyn Explainer>>) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_sink(mut self, sink: Option<Box<dyn RunSink>>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_notifier(mut self, notifier: Option<Box<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.ctx.run_id
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Load `data_path` and run every stage.
    pub fn run(&self, data_path: &Path) -> Result<PipelineOutcome, PipelineError> {
        let mut stages = Vec::with_capacity(Stage::PIPELINE.len() + 1);
        log_event!(
            self.ctx,
            INFO,
            event_names::RUN_STARTED,
            Stage::Init,
            "Starting run",
            dataset = tracing::field::display(data_path.display()),
            model = tracing::field::display(self.config.model.kind)
        );

        let result = self
            .load_stage(&mut stages, || self.load(data_path))
            .and_then(|split| self.run_split(&data_path.display().to_string(), split, stages));
        if let Err(err) = &result {
            log_event!(
                self.ctx,
                ERROR,
                event_names::RUN_FAILED,
                err.stage(),
                "Run failed",
                code = err.error().code(),
                error = tracing::field::display(err.error())
            );
        }
        result
    }

    /// Run every stage on an already prepared dataset. Load only splits it.
    pub fn run_prepared(&self, dataset_name: &str, data: LabeledDataset) -> Result<PipelineOutcome, PipelineError> {
        let mut stages = Vec::with_capacity(Stage::PIPELINE.len() + 1);
        let split = self.load_stage(&mut stages, || Ok(data))?;
        self.run_split(dataset_name, split, stages)
    }

    /// Obtain the dataset and split it, traced as the Load stage.
    fn load_stage(
        &self,
        stages: &mut Vec<StageRecord>,
        load: impl FnOnce() -> Result<LabeledDataset, bb_common::Error>,
    ) -> Result<TrainTestSplit, PipelineError> {
        let timer = StageTimer::start(&self.ctx, Stage::Load);
        self.fatal(timer, stages, || {
            let data = load()?;
            Ok(bb_data::train_test_split(
                &data,
                self.config.data.test_size,
                self.config.data.split_seed,
            )?)
        })
    }

    fn run_split(
        &self,
        dataset_name: &str,
        split: TrainTestSplit,
        mut stages: Vec<StageRecord>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let TrainTestSplit { train, test } = split;

        // Train
        let timer = StageTimer::start(&self.ctx, Stage::Train);
        let model = self.fatal(timer, &mut stages, || self.train(&train, &test))?;

        // Mutate
        let timer = StageTimer::start(&self.ctx, Stage::Mutate);
        let plan = MutationPlan::default_composition(&self.config.mutation, self.config.mutation.seed);
        let mutated = self.fatal(timer, &mut stages, || self.mutate(&plan, &test.features))?;

        // Drift
        let timer = StageTimer::start(&self.ctx, Stage::Drift);
        let drift = self.detector.compare(&test.features, &mutated);
        stages.push(drift_stage_record(timer, &drift));

        // Robustness
        let timer = StageTimer::start(&self.ctx, Stage::Robustness);
        let robustness = self.fatal(timer, &mut stages, || {
            let (reference, mutated_metrics) =
                robustness::evaluate(model.as_ref(), &test.features, &test.labels, &mutated, &test.labels)?;
            let report = robustness::build_report(&reference, &mutated_metrics);
            self.log_robustness(&report);
            Ok(report)
        })?;

        // Explain
        let timer = StageTimer::start(&self.ctx, Stage::Explain);
        let attribution = self.explain(&model, &test.features);
        stages.push(match &attribution {
            Ok(Some(_)) => timer.finish(StageStatus::Succeeded, None),
            Ok(None) => timer.finish(StageStatus::Skipped, None),
            Err(message) => timer.finish(StageStatus::Failed, Some(message.clone())),
        });
        let attribution = attribution.ok().flatten();

        let report = ExperimentReportBuilder::new(self.ctx.run_id.clone())
            .dataset(dataset_name)
            .model(model.name())
            .robustness(robustness)
            .drift(drift)
            .note(format!("mutation plan: {}", describe_plan(&plan)))
            .build()
            .map_err(|e| PipelineError::Fatal {
                stage: Stage::Robustness,
                source: e.into(),
            })?;
        let markdown = render_markdown(&report);

        // Persist
        let timer = StageTimer::start(&self.ctx, Stage::Persist);
        let persistence = self.persist(dataset_name, &plan, &report, &markdown, attribution.as_ref(), &mutated);
        stages.push(match &persistence {
            PersistenceStatus::Persisted { .. } => timer.finish(StageStatus::Succeeded, None),
            PersistenceStatus::Skipped => timer.finish(StageStatus::Skipped, None),
            PersistenceStatus::Failed { message } => {
                log_event!(
                    self.ctx,
                    ERROR,
                    event_names::PERSIST_FAILED,
                    Stage::Persist,
                    "Failed to persist run",
                    error = tracing::field::display(message)
                );
                timer.finish(StageStatus::Failed, Some(message.clone()))
            }
        });

        // Notify
        if let Some(notifier) = &self.notifier {
            let timer = StageTimer::start(&self.ctx, Stage::Notify);
            stages.push(match notifier.notify(&run_note(&report)) {
                Ok(()) => timer.finish(StageStatus::Succeeded, None),
                Err(e) => {
                    log_event!(
                        self.ctx,
                        WARN,
                        event_names::NOTIFY_FAILED,
                        Stage::Notify,
                        "Notification failed",
                        error = tracing::field::display(&e)
                    );
                    timer.finish(StageStatus::Failed, Some(e.to_string()))
                }
            });
        }

        log_event!(
            self.ctx,
            INFO,
            event_names::RUN_FINISHED,
            Stage::Persist,
            "Run finished",
            drift_backends_failed = report.drift().failed(),
            persisted = !persistence.is_failed()
        );

        Ok(PipelineOutcome {
            run_id: self.ctx.run_id.clone(),
            report,
            markdown,
            stages,
            persistence,
            attribution,
            mutated_features: mutated,
        })
    }

    /// Run a fatal stage, recording its trace either way.
    fn fatal<T>(
        &self,
        timer: StageTimer<'_>,
        stages: &mut Vec<StageRecord>,
        f: impl FnOnce() -> Result<T, bb_common::Error>,
    ) -> Result<T, PipelineError> {
        let stage = timer.stage();
        match f() {
            Ok(value) => {
                stages.push(timer.finish(StageStatus::Succeeded, None));
                Ok(value)
            }
            Err(source) => {
                stages.push(timer.finish(StageStatus::Failed, Some(source.to_string())));
                Err(PipelineError::Fatal { stage, source })
            }
        }
    }

    fn load(&self, path: &Path) -> Result<LabeledDataset, bb_common::Error> {
        let raw = bb_data::load(path)?;
        let data = bb_data::prepare(&raw, self.config.data.label_column.as_deref())?;
        log_event!(
            self.ctx,
            INFO,
            event_names::DATA_LOADED,
            Stage::Load,
            "Loaded dataset",
            rows = data.n_rows(),
            raw_columns = raw.n_columns(),
            features = data.features.n_columns()
        );
        Ok(data)
    }

    fn train(&self, train: &LabeledDataset, test: &LabeledDataset) -> Result<Arc<dyn Classifier>, bb_common::Error> {
        let model = self.trainer.fit(&train.features, &train.labels)?;
        log_event!(
            self.ctx,
            INFO,
            event_names::MODEL_TRAINED,
            Stage::Train,
            "Trained model",
            model = model.name(),
            rows = train.n_rows(),
            features = model.feature_names().len()
        );

        let predictions = model.predict(&test.features)?;
        let matrix = ConfusionMatrix::from_labels(&test.labels, &predictions)?;
        let metrics = robustness::metrics_from_matrix(&matrix);
        let metric = |m| metrics.get(m).unwrap_or(f64::NAN);
        log_event!(
            self.ctx,
            INFO,
            event_names::BASELINE_EVALUATED,
            Stage::Train,
            "Baseline evaluation",
            accuracy = metric(bb_common::Metric::Accuracy),
            precision = metric(bb_common::Metric::Precision),
            recall = metric(bb_common::Metric::Recall),
            f1 = metric(bb_common::Metric::F1),
            confusion = tracing::field::display(matrix.to_log_string())
        );
        Ok(model)
    }

    fn mutate(&self, plan: &MutationPlan, features: &Dataset) -> Result<Dataset, bb_common::Error> {
        let mutated = plan.apply(features)?;
        for (idx, step) in plan.steps().iter().enumerate() {
            log_event!(
                self.ctx,
                DEBUG,
                event_names::MUTATION_APPLIED,
                Stage::Mutate,
                "Mutation step",
                step = idx,
                operator = tracing::field::display(step.operator),
                seed = step.seed
            );
        }
        log_event!(
            self.ctx,
            INFO,
            event_names::STAGE_FINISHED,
            Stage::Mutate,
            "Mutated held-out features",
            rows = mutated.n_rows(),
            columns_before = features.n_columns(),
            columns_after = mutated.n_columns()
        );
        Ok(mutated)
    }

    fn log_robustness(&self, report: &RobustnessReport) {
        let (worst_metric, worst_pct) = report
            .degradation
            .worst()
            .map(|(m, v)| (m.as_str(), v))
            .unwrap_or(("none", 0.0));
        log_event!(
            self.ctx,
            INFO,
            event_names::ROBUSTNESS_SCORED,
            Stage::Robustness,
            "Scored robustness",
            worst_metric = worst_metric,
            worst_degradation_pct = worst_pct
        );
    }

    /// `Ok(None)` when explanation is disabled; `Err` carries the reason.
    fn explain(&self, model: &Arc<dyn Classifier>, features: &Dataset) -> Result<Option<Attribution>, String> {
        let Some(explainer) = &self.explainer else {
            return Ok(None);
        };
        explain_bounded(
            Arc::clone(explainer),
            Arc::clone(model),
            Arc::new(features.clone()),
            Duration::from_millis(self.config.explain.timeout_ms),
        )
        .map(Some)
        .map_err(|e| {
            log_event!(
                self.ctx,
                WARN,
                event_names::EXPLAIN_FAILED,
                Stage::Explain,
                "Explanation failed; continuing without attribution",
                error = tracing::field::display(&e)
            );
            e.to_string()
        })
    }

    fn persist(
        &self,
        dataset_name: &str,
        plan: &MutationPlan,
        report: &ExperimentReport,
        markdown: &str,
        attribution: Option<&Attribution>,
        mutated: &Dataset,
    ) -> PersistenceStatus {
        let Some(sink) = &self.sink else {
            return PersistenceStatus::Skipped;
        };
        let result = self
            .run_record(dataset_name, plan, report, attribution, mutated)
            .and_then(|record| sink.persist(&record, markdown).map_err(bb_common::Error::from));
        match result {
            Ok(receipt) => PersistenceStatus::Persisted {
                run_dir: receipt.run_dir,
                attempts: receipt.attempts,
            },
            Err(e) => PersistenceStatus::Failed {
                message: e.to_string(),
            },
        }
    }

    fn run_record(
        &self,
        dataset_name: &str,
        plan: &MutationPlan,
        report: &ExperimentReport,
        attribution: Option<&Attribution>,
        mutated: &Dataset,
    ) -> Result<RunRecord, bb_common::Error> {
        let mut record = RunRecord::new(report.run_id());
        record.add_parameter("model_type", self.config.model.kind.to_string());
        record.add_parameter("dataset", dataset_name);
        record.add_parameter("mutation_plan", describe_plan(plan));
        record.add_parameter("mutation_seed", plan.base_seed().to_string());
        record.add_parameter("split_seed", self.config.data.split_seed.to_string());
        record.add_parameter("test_size", self.config.data.test_size.to_string());
        record.add_parameter("drift_backends", self.detector.backend_names().join(","));
        if let Some(snapshot) = &self.snapshot {
            record.add_parameter("config_source", snapshot.source.clone());
            record.add_parameter("config_schema_version", snapshot.schema_version.clone());
            if let Some(hash) = &snapshot.content_hash {
                record.add_parameter("config_sha256", hash.clone());
            }
        }

        for (metric, value) in report.reference_metrics().iter() {
            record.add_metric(format!("reference.{}", metric), value);
        }
        for (metric, value) in report.mutated_metrics().iter() {
            record.add_metric(format!("mutated.{}", metric), value);
        }
        for (metric, value) in report.degradation().iter() {
            record.add_metric(format!("degradation.{}", metric), value);
        }
        for result in report.drift().iter() {
            if let Some(score) = result.score() {
                record.add_metric(format!("drift.{}.score", result.backend), score);
            }
            if let Some(p) = result.p_value() {
                record.add_metric(format!("drift.{}.p_value", result.backend), p);
            }
        }

        record.add_bytes(REPORT_JSON_FILE, render_json(report)?.into_bytes());
        if let Some(attribution) = attribution {
            record.add_json(ATTRIBUTION_FILE, attribution)?;
        }
        if self.config.output.write_dataset {
            record.add_bytes(MUTATED_FEATURES_FILE, mutated.to_csv_bytes()?);
        }
        record.validate(&[MANIFEST_FILE_NAME, REPORT_FILE_NAME])?;
        Ok(record)
    }
}

fn drift_stage_record(timer: StageTimer<'_>, drift: &DriftComparison) -> StageRecord {
    let failed = drift.failed();
    if drift.is_empty() {
        timer.finish(StageStatus::Skipped, None)
    } else if failed == 0 {
        timer.finish(StageStatus::Succeeded, None)
    } else {
        let status = if failed == drift.len() {
            StageStatus::Failed
        } else {
            StageStatus::Partial
        };
        timer.finish(status, Some(format!("{} of {} backends failed", failed, drift.len())))
    }
}

/// Human-readable plan, e.g. `noise(intensity=0.05) -> drop(ratio=0.1)`.
pub fn describe_plan(plan: &MutationPlan) -> String {
    plan.steps()
        .iter()
        .map(|s| s.operator.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::{DriftBackend, FeatureReportBackend};
    use crate::model::MajorityTrainer;
    use bb_common::{BackendErrorKind, BackendFailure, DriftPayload};
    use bb_data::Column;

    fn labeled(rows: usize) -> LabeledDataset {
        let columns = (0..3)
            .map(|c| {
                (
                    format!("f{}", c),
                    Column::Numeric((0..rows).map(|r| ((r * (c + 3)) % 17) as f64).collect()),
                )
            })
            .collect();
        let features = Dataset::from_columns(columns).unwrap();
        let labels = (0..rows).map(|r| if r % 3 == 0 { "yes" } else { "no" }.to_string()).collect();
        LabeledDataset::new(features, labels).unwrap()
    }

    fn offline(config: ExperimentConfig) -> Pipeline {
        Pipeline::new(config)
            .unwrap()
            .with_sink(None)
            .with_notifier(None)
    }

    struct Broken;

    impl DriftBackend for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn detect(&self, _: &Dataset, _: &Dataset) -> Result<DriftPayload, BackendFailure> {
            Err(BackendFailure::new(BackendErrorKind::Numerical, "always fails"))
        }
    }

    #[test]
    fn test_stage_order() {
        let outcome = offline(ExperimentConfig::default())
            .run_prepared("memory", labeled(60))
            .unwrap();
        let order: Vec<Stage> = outcome.stages.iter().map(|s| s.stage).collect();
        assert_eq!(order, Stage::PIPELINE.to_vec());
        assert_eq!(outcome.persistence, PersistenceStatus::Skipped);
        assert!(outcome.attribution.is_some());
        assert_eq!(outcome.mutated_features.n_rows(), 12);
    }

    #[test]
    fn test_partial_drift_is_not_fatal() {
        let detector = DriftDetector::new(Duration::from_secs(10))
            .with_backend(Arc::new(Broken))
            .with_backend(Arc::new(FeatureReportBackend::default()));
        let outcome = offline(ExperimentConfig::default())
            .with_detector(detector)
            .run_prepared("memory", labeled(60))
            .unwrap();
        let drift = outcome.stage(Stage::Drift).unwrap();
        assert_eq!(drift.status, StageStatus::Partial);
        assert!(outcome.report.drift().is_partial());
        assert!(!outcome.is_clean());
    }

    struct Refusing;

    impl Notifier for Refusing {
        fn notify(&self, _: &str) -> Result<(), crate::notify::NotifyError> {
            Err(crate::notify::NotifyError::Rejected("HTTP 503".into()))
        }
    }

    struct Unexplainable;

    impl Explainer for Unexplainable {
        fn explain(&self, _: &dyn Classifier, _: &Dataset) -> Result<Attribution, crate::explain::ExplainError> {
            Err(crate::explain::ExplainError::EmptySample)
        }
    }

    #[test]
    fn test_notify_and_explain_failures_are_recorded() {
        let outcome = offline(ExperimentConfig::default())
            .with_notifier(Some(Box::new(Refusing)))
            .with_explainer(Some(Arc::new(Unexplainable)))
            .run_prepared("memory", labeled(40))
            .unwrap();

        let notify = outcome.stage(Stage::Notify).unwrap();
        assert_eq!(notify.status, StageStatus::Failed);
        assert!(notify.detail.as_deref().unwrap_or_default().contains("HTTP 503"));

        let explain = outcome.stage(Stage::Explain).unwrap();
        assert_eq!(explain.status, StageStatus::Failed);
        assert!(explain.detail.as_deref().unwrap_or_default().contains("empty"));
        assert!(outcome.attribution.is_none());
        assert_eq!(outcome.stages.last().map(|s| s.stage), Some(Stage::Notify));
    }

    #[test]
    fn test_split_failure_is_traced_under_load() {
        let pipeline = offline(ExperimentConfig::default());
        let mut stages = Vec::new();
        let err = pipeline
            .load_stage(&mut stages, || Ok(labeled(1)))
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Load);
        assert_eq!(err.error().code(), 1205);
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].stage, Stage::Load);
        assert_eq!(stages[0].status, StageStatus::Failed);
        assert!(stages[0].detail.as_deref().unwrap_or_default().contains("split"));

        let err = pipeline.run_prepared("memory", labeled(1)).unwrap_err();
        assert_eq!(err.stage(), Stage::Load);
    }

    #[test]
    fn test_empty_feature_set_fails_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.csv");
        let mut csv = String::from("note,label\n");
        for i in 0..40 {
            csv.push_str(if i % 2 == 0 { ",a\n" } else { ",b\n" });
        }
        std::fs::write(&path, csv).unwrap();

        let err = offline(ExperimentConfig::default()).run(&path).unwrap_err();
        assert_eq!(err.stage(), Stage::Load);
        assert_eq!(err.error().code(), 1205);
    }

    #[test]
    fn test_invalid_mutation_is_fatal() {
        let mut config = ExperimentConfig::default();
        config.mutation.noise_intensity = -1.0;
        let err = offline(config).run_prepared("memory", labeled(30)).unwrap_err();
        assert_eq!(err.stage(), Stage::Mutate);
        assert_eq!(err.error().code(), 1002);
    }

    #[test]
    fn test_majority_model_reports_zero_degradation() {
        let outcome = offline(ExperimentConfig::default())
            .with_trainer(Box::new(MajorityTrainer))
            .with_explainer(None)
            .run_prepared("memory", labeled(50))
            .unwrap();
        assert!(outcome.report.degradation().iter().all(|(_, v)| v == 0.0));
        assert_eq!(outcome.stage(Stage::Explain).unwrap().status, StageStatus::Skipped);
        assert!(outcome.markdown.starts_with("# Experiment Report"));
    }

    #[test]
    fn test_describe_plan() {
        let plan = MutationPlan::default_composition(&bb_config::MutationConfig::default(), 1);
        assert_eq!(describe_plan(&plan).matches(" -> ").count(), 2);
        assert!(describe_plan(&plan).starts_with("noise("));
    }
}
