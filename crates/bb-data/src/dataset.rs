//! In-memory tabular dataset.
//!
//! A [`Dataset`] is an ordered list of uniquely named columns sharing one row
//! count. Numeric cells are `f64` with NaN for missing; categorical cells are
//! `Option<String>`. Datasets are values: every transformation returns a new
//! dataset and leaves the input untouched.

use std::collections::HashSet;
use std::io::Write;

use crate::error::DataError;

/// One column of cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Categorical(_) => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&[Option<String>]> {
        match self {
            Column::Numeric(_) => None,
            Column::Categorical(v) => Some(v),
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => v.get(row).map_or(true, |x| x.is_nan()),
            Column::Categorical(v) => v.get(row).map_or(true, Option::is_none),
        }
    }

    /// Cell rendered as text; `None` when missing.
    ///
    /// Integral numbers render without a fractional part, so a label column
    /// of `0.0`/`1.0` reads as `0`/`1`.
    pub fn value_string(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(v) => {
                let x = *v.get(row)?;
                if x.is_nan() {
                    None
                } else if x.fract() == 0.0 && x.abs() < 1e15 {
                    Some(format!("{}", x as i64))
                } else {
                    Some(format!("{}", x))
                }
            }
            Column::Categorical(v) => v.get(row).cloned().flatten(),
        }
    }

    /// Gather cells at the given row indices.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&r| v[r]).collect()),
            Column::Categorical(v) => Column::Categorical(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }
}

/// Named columns with a shared row count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset, checking name uniqueness and equal column lengths.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self, DataError> {
        let mut dataset = Dataset::default();
        for (name, column) in columns {
            dataset.push_column(name, column)?;
        }
        Ok(dataset)
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), DataError> {
        let name = name.into();
        if self.names.iter().any(|n| *n == name) {
            return Err(DataError::DuplicateColumn(name));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(DataError::RowCountMismatch {
                column: name,
                expected: self.n_rows,
                actual: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index_of(name).map(|i| &self.columns[i])
    }

    /// Numeric cells of a column, if it exists and is numeric.
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(Column::as_numeric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Names of numeric columns in order.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, c)| c.is_numeric())
            .map(|(n, _)| n)
            .collect()
    }

    /// New dataset with only the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            n_rows: rows.len(),
        }
    }

    /// New dataset without the named columns. Unknown names are an error.
    pub fn without_columns(&self, drop: &[&str]) -> Result<Dataset, DataError> {
        for name in drop {
            if !self.contains(name) {
                return Err(DataError::UnknownColumn((*name).to_string()));
            }
        }
        let drop: HashSet<&str> = drop.iter().copied().collect();
        let mut out = Dataset {
            n_rows: self.n_rows,
            ..Default::default()
        };
        for (name, column) in self.iter() {
            if !drop.contains(name) {
                out.names.push(name.to_string());
                out.columns.push(column.clone());
            }
        }
        Ok(out)
    }

    /// Copy of this dataset with `f` applied to every numeric cell.
    ///
    /// `f` receives the column index and the current value. Categorical
    /// columns are copied unchanged. Cells are visited column by column,
    /// top to bottom, so a seeded `f` is reproducible.
    pub fn map_numeric<F>(&self, mut f: F) -> Dataset
    where
        F: FnMut(usize, f64) -> f64,
    {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| match column {
                Column::Numeric(values) => Column::Numeric(values.iter().map(|&v| f(idx, v)).collect()),
                other => other.clone(),
            })
            .collect();
        Dataset {
            names: self.names.clone(),
            columns,
            n_rows: self.n_rows,
        }
    }

    /// Serialize as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), DataError> {
        let batch = crate::arrow_io::to_record_batch(self)?;
        let mut csv = arrow::csv::WriterBuilder::new()
            .with_header(true)
            .build(writer);
        csv.write(&batch)?;
        Ok(())
    }

    /// CSV serialization as bytes.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, DataError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }
}

/// Feature table plus row-aligned labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub features: Dataset,
    pub labels: Vec<String>,
}

impl LabeledDataset {
    pub fn new(features: Dataset, labels: Vec<String>) -> Result<Self, DataError> {
        if features.n_columns() > 0 && features.n_rows() != labels.len() {
            return Err(DataError::RowCountMismatch {
                column: "label".to_string(),
                expected: features.n_rows(),
                actual: labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn take_rows(&self, rows: &[usize]) -> LabeledDataset {
        LabeledDataset {
            features: self.features.take_rows(rows),
            labels: rows.iter().map(|&r| self.labels[r].clone()).collect(),
        }
    }
}
