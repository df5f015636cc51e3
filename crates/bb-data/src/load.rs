//! Dataset loading by file extension.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};

use crate::arrow_io::dataset_from_batches;
use crate::dataset::Dataset;
use crate::error::DataError;

/// Rows examined when inferring CSV column types.
const CSV_INFER_MAX_RECORDS: usize = 1000;

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Parquet,
    Arff,
}

impl DatasetFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(DatasetFormat::Csv),
            "parquet" => Ok(DatasetFormat::Parquet),
            "arff" => Ok(DatasetFormat::Arff),
            "" => Err(DataError::UnsupportedFormat(format!(
                "{} (no extension)",
                path.display()
            ))),
            other => Err(DataError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFormat::Csv => "csv",
            DatasetFormat::Parquet => "parquet",
            DatasetFormat::Arff => "arff",
        }
    }
}

/// Load a dataset from `.csv`, `.parquet` or `.arff`.
pub fn load(path: &Path) -> Result<Dataset, DataError> {
    let format = DatasetFormat::from_path(path)?;
    if !path.is_file() {
        return Err(DataError::NotFound(path.display().to_string()));
    }
    info!(path = %path.display(), format = format.as_str(), "Loading dataset");

    let dataset = match format {
        DatasetFormat::Csv => load_csv(path)?,
        DatasetFormat::Parquet => load_parquet(path)?,
        DatasetFormat::Arff => {
            let text = std::fs::read_to_string(path)?;
            crate::arff::parse_arff(&text)?
        }
    };

    if dataset.n_rows() == 0 {
        return Err(DataError::Empty);
    }
    info!(
        rows = dataset.n_rows(),
        columns = dataset.n_columns(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Load a CSV file with a header row, inferring column types.
pub fn load_csv(path: &Path) -> Result<Dataset, DataError> {
    let mut file = File::open(path)?;
    let (schema, records) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(CSV_INFER_MAX_RECORDS))?;
    debug!(records, fields = schema.fields().len(), "Inferred CSV schema");
    file.rewind()?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    dataset_from_batches(&schema, &batches)
}

/// Load every row group of a Parquet file.
pub fn load_parquet(path: &Path) -> Result<Dataset, DataError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;
    dataset_from_batches(&schema, &batches)
}
