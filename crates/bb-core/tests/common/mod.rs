//! Shared fixtures for bb-core integration tests.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use bb_data::{Column, Dataset};

/// `rows` x `features` numeric table with smoothly varying, distinct values.
pub fn numeric_dataset(rows: usize, features: usize) -> Dataset {
    let columns = (0..features)
        .map(|c| {
            let values = (0..rows)
                .map(|r| ((r * 7 + c * 13) % 23) as f64 / 4.0 + c as f64)
                .collect();
            (format!("f{}", c), Column::Numeric(values))
        })
        .collect();
    Dataset::from_columns(columns).expect("fixture columns have equal length")
}

/// Binary labels that depend on `f0`.
pub fn labels_for(data: &Dataset) -> Vec<String> {
    data.numeric("f0")
        .expect("fixture has f0")
        .iter()
        .map(|v| if *v > 2.75 { "yes" } else { "no" }.to_string())
        .collect()
}

/// Write a CSV with five numeric features and a `label` column.
pub fn write_csv(dir: &Path, rows: usize) -> PathBuf {
    let data = numeric_dataset(rows, 5);
    let labels = labels_for(&data);
    let mut out = String::new();
    let header: Vec<&str> = data.column_names().iter().map(String::as_str).collect();
    let _ = writeln!(out, "{},label", header.join(","));
    for (r, label) in labels.iter().enumerate() {
        let cells: Vec<String> = data
            .iter()
            .map(|(_, col)| col.value_string(r).unwrap_or_default())
            .collect();
        let _ = writeln!(out, "{},{}", cells.join(","), label);
    }
    let path = dir.join("data.csv");
    std::fs::write(&path, out).expect("write fixture csv");
    path
}
