//! Classification metrics.
//!
//! Provides:
//! - Accuracy
//! - Support-weighted precision, recall and F1
//! - Confusion matrix
//!
//! A class with no predicted (or no true) rows contributes 0 to the
//! corresponding per-class ratio instead of NaN.

use std::collections::BTreeSet;

use bb_common::MetricSet;
use serde::{Deserialize, Serialize};

use super::RobustnessError;

/// Counts of true (rows) against predicted (columns) labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Union of true and predicted labels, sorted.
    pub labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[String], y_pred: &[String]) -> Result<Self, RobustnessError> {
        check_lengths(y_true, y_pred)?;
        let labels: Vec<String> = y_true
            .iter()
            .chain(y_pred)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let k = labels.len();
        let mut counts = vec![vec![0usize; k]; k];
        for (t, p) in y_true.iter().zip(y_pred) {
            // Both searches succeed: every label is in the union.
            let i = labels.binary_search(t).unwrap_or_default();
            let j = labels.binary_search(p).unwrap_or_default();
            counts[i][j] += 1;
        }
        Ok(Self { labels, counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    /// Rows whose true label is class `i`.
    pub fn support(&self, i: usize) -> usize {
        self.counts[i].iter().sum()
    }

    /// Rows predicted as class `i`.
    pub fn predicted(&self, i: usize) -> usize {
        self.counts.iter().map(|row| row[i]).sum()
    }

    /// Compact single-line rendering for logs, e.g. `a:[3,1] b:[0,4]`.
    pub fn to_log_string(&self) -> String {
        self.labels
            .iter()
            .zip(&self.counts)
            .map(|(label, row)| {
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                format!("{}:[{}]", label, cells.join(","))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Per-class precision, recall and F1 averaged with class-support weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn weighted_scores(matrix: &ConfusionMatrix) -> WeightedScores {
    let total = matrix.total();
    if total == 0 {
        return WeightedScores {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        };
    }
    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;
    for i in 0..matrix.labels.len() {
        let support = matrix.support(i);
        if support == 0 {
            continue;
        }
        let tp = matrix.counts[i][i];
        let p = ratio(tp, matrix.predicted(i));
        let r = ratio(tp, support);
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        let w = support as f64 / total as f64;
        precision += w * p;
        recall += w * r;
        f1 += w * f;
    }
    WeightedScores {
        precision,
        recall,
        f1,
    }
}

pub fn accuracy(y_true: &[String], y_pred: &[String]) -> Result<f64, RobustnessError> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(ratio(correct, y_true.len()))
}

/// Accuracy and weighted precision/recall/F1 for one prediction run.
pub fn classification_metrics(y_true: &[String], y_pred: &[String]) -> Result<MetricSet, RobustnessError> {
    let matrix = ConfusionMatrix::from_labels(y_true, y_pred)?;
    Ok(metrics_from_matrix(&matrix))
}

pub fn metrics_from_matrix(matrix: &ConfusionMatrix) -> MetricSet {
    let scores = weighted_scores(matrix);
    MetricSet::from_values(
        ratio(matrix.correct(), matrix.total()),
        scores.precision,
        scores.recall,
        scores.f1,
    )
}

fn check_lengths(y_true: &[String], y_pred: &[String]) -> Result<(), RobustnessError> {
    if y_true.len() != y_pred.len() {
        return Err(RobustnessError::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    Ok(())
}
