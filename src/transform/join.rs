//! Many-to-one left joins.
//!
//! Every join in the pipeline attaches reference data (names, geometry) to
//! counted rows. The right-hand side must therefore hold at most one row per
//! key: [`left_join`] refuses a non-unique right side instead of letting it
//! multiply counts, and [`dedup_on_key`] is how callers make it unique.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::{cast, take, take_record_batch};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, Rows, SortField};
use arrow::util::display::array_value_to_string;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::error::{JoinCardinalityError, PipelineError, Result};
use crate::transform::normalize::normalize_key_column;
use crate::utils::arrow::{get_column, row_index};

/// One column pair of a join condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey {
    pub left: String,
    pub right: String,
    /// Compare normalized text on both sides instead of raw values
    pub normalize: bool,
}

impl JoinKey {
    /// Join on a column that has the same name on both sides
    #[must_use]
    pub fn on(column: &str) -> Self {
        Self::new(column, column)
    }

    #[must_use]
    pub fn new(left: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
            normalize: false,
        }
    }

    /// Match on [`normalize_key`](crate::transform::normalize::normalize_key) of both sides
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }
}

/// Left join `other` onto `base`
///
/// Keeps every row of `base` in order and appends the non-key columns of
/// `other`. Rows without a match get nulls in those columns. Null keys never
/// match.
///
/// # Errors
///
/// * [`JoinCardinalityError`] if a key value occurs more than once in `other`
/// * a schema error if a key column is missing or an appended column name
///   already exists in `base`
pub fn left_join(base: &RecordBatch, other: &RecordBatch, on: &[JoinKey]) -> Result<RecordBatch> {
    if on.is_empty() {
        return Err(PipelineError::schema("a join needs at least one key"));
    }

    let right_keys = key_arrays(other, on.iter().map(|k| (k.right.as_str(), k.normalize)))?;
    let left_keys = key_arrays(base, on.iter().map(|k| (k.left.as_str(), k.normalize)))?;

    // Left keys take the right side's types so both encode to comparable rows
    let left_keys = left_keys
        .iter()
        .zip(&right_keys)
        .map(|(l, r)| {
            if l.data_type() == r.data_type() {
                Ok(l.clone())
            } else {
                cast(l, r.data_type()).map_err(PipelineError::from)
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let converter = RowConverter::new(
        right_keys
            .iter()
            .map(|a| SortField::new(a.data_type().clone()))
            .collect(),
    )?;
    let right_rows = converter.convert_columns(&right_keys)?;
    let left_rows = converter.convert_columns(&left_keys)?;

    let right_index = unique_index(&right_rows, &right_keys, on)?;

    let indices: UInt32Array = (0..base.num_rows())
        .map(|i| {
            if left_keys.iter().any(|a| a.is_null(i)) {
                None
            } else {
                right_index.get(&left_rows.row(i)).copied()
            }
        })
        .collect();

    // Append the right side's payload columns
    let right_schema = other.schema();
    let base_schema = base.schema();
    let mut fields: Vec<_> = base_schema.fields().iter().cloned().collect();
    let mut columns = base.columns().to_vec();

    for (idx, field) in right_schema.fields().iter().enumerate() {
        if on.iter().any(|k| &k.right == field.name()) {
            continue;
        }
        if base_schema.index_of(field.name()).is_ok() {
            return Err(PipelineError::schema(format!(
                "column '{}' exists on both sides of the join",
                field.name()
            )));
        }
        columns.push(take(other.column(idx).as_ref(), &indices, None)?);
        fields.push(Arc::new(Field::new(
            field.name(),
            field.data_type().clone(),
            true,
        )));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Keep the first row for each distinct key
///
/// Rows with a null key are kept, since they can never match in a join.
/// Returns the deduplicated table and the number of rows dropped.
pub fn dedup_on_key(
    table: &RecordBatch,
    keys: &[&str],
    normalize: bool,
) -> Result<(RecordBatch, usize)> {
    let arrays = key_arrays(table, keys.iter().map(|k| (*k, normalize)))?;
    let converter = RowConverter::new(
        arrays
            .iter()
            .map(|a| SortField::new(a.data_type().clone()))
            .collect(),
    )?;
    let rows = converter.convert_columns(&arrays)?;

    let mut seen = FxHashMap::default();
    let mut keep = Vec::with_capacity(table.num_rows());
    for i in 0..table.num_rows() {
        if arrays.iter().any(|a| a.is_null(i)) || seen.insert(rows.row(i), ()).is_none() {
            keep.push(row_index(i)?);
        }
    }
    let keep = UInt32Array::from(keep);

    let dropped = table.num_rows() - keep.len();
    if dropped == 0 {
        return Ok((table.clone(), 0));
    }
    Ok((take_record_batch(table, &keep)?, dropped))
}

fn key_arrays<'a>(
    table: &RecordBatch,
    keys: impl Iterator<Item = (&'a str, bool)>,
) -> Result<Vec<ArrayRef>> {
    keys.map(|(name, normalize)| {
        if normalize {
            normalize_key_column(table, name)
        } else {
            get_column(table, name)
        }
    })
    .collect()
}

/// Map each non-null key row to its row index, failing on duplicates
fn unique_index<'r>(
    rows: &'r Rows,
    arrays: &[ArrayRef],
    on: &[JoinKey],
) -> Result<FxHashMap<arrow::row::Row<'r>, u32>> {
    let mut index = FxHashMap::default();
    for i in 0..rows.num_rows() {
        if arrays.iter().any(|a| a.is_null(i)) {
            continue;
        }
        if index.insert(rows.row(i), row_index(i)?).is_some() {
            let row = rows.row(i);
            let occurrences = (0..rows.num_rows()).filter(|&j| rows.row(j) == row).count();
            let value = arrays
                .iter()
                .map(|a| array_value_to_string(a.as_ref(), i))
                .collect::<std::result::Result<Vec<_>, _>>()?
                .join(", ");
            return Err(JoinCardinalityError {
                key: on.iter().map(|k| k.right.as_str()).join(", "),
                value,
                occurrences,
            }
            .into());
        }
    }
    Ok(index)
}
