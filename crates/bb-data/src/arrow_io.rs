//! Conversion between [`Dataset`] and Arrow record batches.
//!
//! Arrow numeric types (integers, floats, decimals) become numeric columns
//! with nulls mapped to NaN; every other type is cast to UTF-8 text and
//! becomes a categorical column.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch, StringArray};
use arrow::compute::{cast, concat};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef};

use crate::dataset::{Column, Dataset};
use crate::error::DataError;

/// Build a dataset from record batches sharing `schema`.
pub fn dataset_from_batches(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<Dataset, DataError> {
    let mut dataset = Dataset::default();
    for (idx, field) in schema.fields().iter().enumerate() {
        let parts: Vec<&dyn Array> = batches.iter().map(|b| b.column(idx).as_ref()).collect();
        let array: ArrayRef = if parts.is_empty() {
            arrow::array::new_empty_array(field.data_type())
        } else {
            concat(&parts)?
        };
        dataset.push_column(field.name().clone(), column_from_array(&array)?)?;
    }
    Ok(dataset)
}

/// Convert one Arrow array to a column.
pub fn column_from_array(array: &ArrayRef) -> Result<Column, DataError> {
    if array.data_type().is_numeric() {
        let floats = cast(array, &DataType::Float64)?;
        let floats = floats.as_primitive::<Float64Type>();
        let values = floats
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        Ok(Column::Numeric(values))
    } else {
        let text = cast(array, &DataType::Utf8)?;
        let text = text.as_string::<i32>();
        let values = text.iter().map(|v| v.map(str::to_string)).collect();
        Ok(Column::Categorical(values))
    }
}

/// Arrow schema for a dataset: Float64 for numeric, Utf8 for categorical.
pub fn schema_for(dataset: &Dataset) -> Schema {
    let fields: Vec<Field> = dataset
        .iter()
        .map(|(name, column)| {
            let data_type = if column.is_numeric() {
                DataType::Float64
            } else {
                DataType::Utf8
            };
            Field::new(name, data_type, true)
        })
        .collect();
    Schema::new(fields)
}

/// Convert a dataset into a single record batch. NaN cells become nulls.
pub fn to_record_batch(dataset: &Dataset) -> Result<RecordBatch, DataError> {
    let schema = Arc::new(schema_for(dataset));
    let arrays: Vec<ArrayRef> = dataset
        .iter()
        .map(|(_, column)| -> ArrayRef {
            match column {
                Column::Numeric(values) => Arc::new(Float64Array::from(
                    values
                        .iter()
                        .map(|v| if v.is_nan() { None } else { Some(*v) })
                        .collect::<Vec<_>>(),
                )),
                Column::Categorical(values) => Arc::new(StringArray::from(
                    values.iter().map(|v| v.as_deref()).collect::<Vec<_>>(),
                )),
            }
        })
        .collect();
    Ok(RecordBatch::try_new(schema, arrays)?)
}
