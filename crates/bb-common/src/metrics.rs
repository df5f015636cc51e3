//! Classification metric records.
//!
//! [`MetricSet`] holds the evaluator's output for one prediction run and
//! [`DegradationSet`] holds the per-metric percentage drop between two runs.
//! [`RobustnessReport`] pairs two metric sets with their degradation.
//! All are keyed by [`Metric`] and iterate in a fixed order
//! (accuracy, precision, recall, f1), which keeps rendered reports stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named classification metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl Metric {
    /// All metrics in canonical order.
    pub const ALL: [Metric; 4] = [Metric::Accuracy, Metric::Precision, Metric::Recall, Metric::F1];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1 => "f1",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric name to value, each value in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<Metric, f64>);

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full four-metric set.
    pub fn from_values(accuracy: f64, precision: f64, recall: f64, f1: f64) -> Self {
        let mut set = Self::new();
        set.insert(Metric::Accuracy, accuracy);
        set.insert(Metric::Precision, precision);
        set.insert(Metric::Recall, recall);
        set.insert(Metric::F1, f1);
        set
    }

    pub fn insert(&mut self, metric: Metric, value: f64) -> Option<f64> {
        self.0.insert(metric, value)
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Metric, f64)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (Metric, f64)>>(iter: I) -> Self {
        MetricSet(iter.into_iter().collect())
    }
}

/// Metric name to percentage drop from reference to mutated.
///
/// Positive values mean the mutated run scored worse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DegradationSet(BTreeMap<Metric, f64>);

impl DegradationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: Metric, pct: f64) -> Option<f64> {
        self.0.insert(metric, pct)
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest degradation across metrics, if any.
    pub fn worst(&self) -> Option<(Metric, f64)> {
        self.iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl FromIterator<(Metric, f64)> for DegradationSet {
    fn from_iter<I: IntoIterator<Item = (Metric, f64)>>(iter: I) -> Self {
        DegradationSet(iter.into_iter().collect())
    }
}

/// Reference metrics, mutated metrics and the degradation between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    pub reference_metrics: MetricSet,
    pub mutated_metrics: MetricSet,
    pub degradation: DegradationSet,
}
