//! Preprocessing: missing-value fill, label extraction and one-hot encoding.
//!
//! [`prepare`] runs the full chain on a freshly loaded table:
//! forward fill over every column (label included), label extraction, then
//! one-hot encoding of the remaining categorical features.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::dataset::{Column, Dataset, LabeledDataset};
use crate::error::DataError;
use crate::DEFAULT_LABEL_COLUMN;

/// Replace missing cells with the most recent non-missing value above them.
///
/// Numeric cells still missing at the top of a column take the first
/// observed value below them; an all-missing numeric column becomes 0.
/// Leading missing categorical cells stay missing and encode as all-zero
/// indicator columns.
pub fn forward_fill(dataset: &Dataset) -> Result<Dataset, DataError> {
    let mut out = Dataset::default();
    for (name, column) in dataset.iter() {
        let filled = match column {
            Column::Numeric(values) => {
                let first = values.iter().copied().find(|v| !v.is_nan()).unwrap_or(0.0);
                let mut last = first;
                Column::Numeric(
                    values
                        .iter()
                        .map(|&v| {
                            if !v.is_nan() {
                                last = v;
                            }
                            last
                        })
                        .collect(),
                )
            }
            Column::Categorical(values) => {
                let mut last: Option<String> = None;
                Column::Categorical(
                    values
                        .iter()
                        .map(|v| {
                            if v.is_some() {
                                last = v.clone();
                            }
                            last.clone()
                        })
                        .collect(),
                )
            }
        };
        out.push_column(name, filled)?;
    }
    Ok(out)
}

/// Replace every categorical column with 0/1 indicator columns.
///
/// Numeric columns keep their order and come first; indicator columns
/// `<column>_<value>` follow, one block per categorical column in original
/// order, values sorted.
pub fn one_hot_encode(dataset: &Dataset) -> Result<Dataset, DataError> {
    let mut out = Dataset::default();
    for (name, column) in dataset.iter() {
        if let Column::Numeric(values) = column {
            out.push_column(name, Column::Numeric(values.clone()))?;
        }
    }
    for (name, column) in dataset.iter() {
        if let Column::Categorical(values) = column {
            let levels: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
            debug!(column = name, levels = levels.len(), "One-hot encoding column");
            for level in levels {
                let indicator = values
                    .iter()
                    .map(|v| if v.as_deref() == Some(level) { 1.0 } else { 0.0 })
                    .collect();
                out.push_column(format!("{}_{}", name, level), Column::Numeric(indicator))?;
            }
        }
    }
    Ok(out)
}

/// Split the label column off a dataset.
///
/// The label is `label_column` when given, otherwise a column named `label`,
/// otherwise the last column. Every row must have a label.
pub fn split_label(dataset: &Dataset, label_column: Option<&str>) -> Result<LabeledDataset, DataError> {
    if dataset.n_columns() < 2 {
        return Err(DataError::Label(format!(
            "need a label and at least one feature, found {} column(s)",
            dataset.n_columns()
        )));
    }

    let label_name = match label_column {
        Some(name) => {
            if !dataset.contains(name) {
                return Err(DataError::Label(format!("label column '{}' not found", name)));
            }
            name.to_string()
        }
        None if dataset.contains(DEFAULT_LABEL_COLUMN) => DEFAULT_LABEL_COLUMN.to_string(),
        None => dataset.column_names()[dataset.n_columns() - 1].clone(),
    };

    let column = dataset
        .column(&label_name)
        .ok_or_else(|| DataError::Label(format!("label column '{}' not found", label_name)))?;
    let mut labels = Vec::with_capacity(dataset.n_rows());
    for row in 0..dataset.n_rows() {
        let value = column.value_string(row).ok_or_else(|| {
            DataError::Label(format!("row {} has no value for '{}'", row, label_name))
        })?;
        labels.push(value);
    }

    let features = dataset.without_columns(&[label_name.as_str()])?;
    LabeledDataset::new(features, labels)
}

/// Full preprocessing chain for a loaded table.
///
/// Fails when encoding leaves no feature columns, e.g. when every feature is
/// an all-missing categorical.
pub fn prepare(raw: &Dataset, label_column: Option<&str>) -> Result<LabeledDataset, DataError> {
    info!("Preprocessing data");
    let filled = forward_fill(raw)?;
    let labeled = split_label(&filled, label_column)?;
    let features = one_hot_encode(&labeled.features)?;
    if features.n_columns() == 0 {
        return Err(DataError::NoFeatures);
    }
    info!(
        rows = features.n_rows(),
        features = features.n_columns(),
        "Preprocessing completed"
    );
    LabeledDataset::new(features, labeled.labels)
}
