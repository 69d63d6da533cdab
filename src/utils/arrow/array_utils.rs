//! Utilities for working with Arrow arrays.
//!
//! Column lookups here fail with a schema error naming the column, so the
//! transformations can use `?` instead of matching on Arrow's own errors.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, Result};

/// Get a column from a record batch by name
pub fn get_column(batch: &RecordBatch, column_name: &str) -> Result<ArrayRef> {
    batch
        .column_by_name(column_name)
        .cloned()
        .ok_or_else(|| PipelineError::schema(format!("column '{column_name}' not found")))
}

/// Downcast a column to a specific array type with clear error messages
///
/// # Type Parameters
///
/// * `A` - The target array type to downcast to
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        PipelineError::schema(format!(
            "column '{column_name}' is {} but {expected_type_name} was expected",
            array.data_type()
        ))
    })
}

/// Get a column as a string array, casting other types
pub fn string_column(batch: &RecordBatch, column_name: &str) -> Result<StringArray> {
    let column = get_column(batch, column_name)?;
    let column = if column.data_type() == &DataType::Utf8 {
        column
    } else {
        cast(&column, &DataType::Utf8)?
    };
    Ok(downcast_array::<StringArray>(&column, column_name, "Utf8")?.clone())
}

/// Get a column as an int64 array, casting other numeric types
pub fn int64_column(batch: &RecordBatch, column_name: &str) -> Result<Int64Array> {
    let column = get_column(batch, column_name)?;
    let column = if column.data_type() == &DataType::Int64 {
        column
    } else if column.data_type().is_numeric() {
        cast(&column, &DataType::Int64)?
    } else {
        return Err(PipelineError::schema(format!(
            "column '{column_name}' is {} but a numeric column was expected",
            column.data_type()
        )));
    };
    Ok(downcast_array::<Int64Array>(&column, column_name, "Int64")?.clone())
}

/// Return `batch` with `column_name` set to `array`
///
/// An existing column of that name is replaced in place; otherwise the column
/// is appended.
pub fn with_column(batch: &RecordBatch, column_name: &str, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let field = Arc::new(Field::new(column_name, array.data_type().clone(), true));

    let mut fields: Vec<_> = schema.fields().iter().cloned().collect();
    let mut columns = batch.columns().to_vec();

    if let Ok(idx) = schema.index_of(column_name) {
        fields[idx] = field;
        columns[idx] = array;
    } else {
        fields.push(field);
        columns.push(array);
    }

    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        columns,
    )?)
}

/// Row position as the `u32` index Arrow's take kernels expect
pub fn row_index(row: usize) -> Result<u32> {
    u32::try_from(row)
        .map_err(|_| PipelineError::schema(format!("row {row} exceeds the u32 index range")))
}

/// Return `batch` without the named columns
pub fn without_columns(batch: &RecordBatch, column_names: &[&str]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let keep: Vec<usize> = (0..schema.fields().len())
        .filter(|&i| !column_names.contains(&schema.field(i).name().as_str()))
        .collect();
    Ok(batch.project(&keep)?)
}
