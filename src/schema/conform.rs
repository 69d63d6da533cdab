//! Conforming loaded batches to a table's column contract.
//!
//! Exports of the same table disagree on physical types (codes stored as
//! integers in one sheet and text in another, years as floats, ...). Each
//! expected column is located by name and cast to its contract type; extra
//! columns are dropped.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::compute::{can_cast_types, cast};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Schema};

use crate::error::LoadError;

/// Project and cast `batch` to `expected`
///
/// Casting is lenient: values that cannot be parsed become null, so a
/// malformed cell is reported by the derivation that needs it rather than
/// failing the whole load.
pub fn conform_batch(
    batch: &RecordBatch,
    expected: &Schema,
    table: &str,
) -> Result<RecordBatch, LoadError> {
    let source_schema = batch.schema();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(expected.fields().len());

    for field in expected.fields() {
        let name = field.name();
        let idx = source_schema
            .index_of(name)
            .map_err(|_| LoadError::MissingColumn {
                table: table.to_string(),
                column: name.clone(),
            })?;

        let column = conform_column(batch.column(idx), field.data_type()).map_err(|reason| {
            LoadError::IncompatibleColumn {
                table: table.to_string(),
                column: name.clone(),
                expected: field.data_type().to_string(),
                reason,
            }
        })?;
        columns.push(column);
    }

    let schema = Arc::new(expected.clone());
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    RecordBatch::try_new(schema, columns).map_err(|e| LoadError::IncompatibleColumn {
        table: table.to_string(),
        column: "*".to_string(),
        expected: "conforming batch".to_string(),
        reason: e.to_string(),
    })
}

fn conform_column(array: &ArrayRef, target: &DataType) -> Result<ArrayRef, String> {
    let source = array.data_type();
    if source == target {
        return Ok(array.clone());
    }

    // Floating point codes would otherwise render as "5001.0"
    if target == &DataType::Utf8 && source.is_floating() {
        let as_int = cast(array, &DataType::Int64).map_err(|e| e.to_string())?;
        return cast(&as_int, target).map_err(|e| e.to_string());
    }

    if !can_cast_types(source, target) {
        return Err(format!("no conversion from {source}"));
    }
    cast(array, target).map_err(|e| e.to_string())
}
