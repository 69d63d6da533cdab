//! Grouping and counting.
//!
//! [`group_count`] is the single aggregation every view is built from. Groups
//! come out in order of first appearance, which is also the tie-break order the
//! selectors rely on.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray, UInt32Array};
use arrow::compute::{SortOptions, sort_to_indices, take, take_record_batch};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};
use rustc_hash::FxHashMap;

use crate::error::{PipelineError, Result, UnknownCodeError};
use crate::utils::arrow::{get_column, int64_column, row_index, string_column};

/// Count rows per distinct combination of `keys`
///
/// Emits the key columns followed by an Int64 column `count_name`. A null key
/// value forms its own group, so the counts always add up to the row count.
pub fn group_count(table: &RecordBatch, keys: &[&str], count_name: &str) -> Result<RecordBatch> {
    if keys.is_empty() {
        return Err(PipelineError::schema("group_count needs at least one key"));
    }

    let key_columns = keys
        .iter()
        .map(|k| get_column(table, k))
        .collect::<Result<Vec<_>>>()?;
    let converter = RowConverter::new(
        key_columns
            .iter()
            .map(|c| SortField::new(c.data_type().clone()))
            .collect(),
    )?;
    let rows = converter.convert_columns(&key_columns)?;

    let mut groups = FxHashMap::default();
    let mut first_rows: Vec<u32> = Vec::new();
    let mut counts: Vec<i64> = Vec::new();
    for i in 0..rows.num_rows() {
        let row = row_index(i)?;
        let group = *groups.entry(rows.row(i)).or_insert_with(|| {
            first_rows.push(row);
            counts.push(0);
            counts.len() - 1
        });
        counts[group] += 1;
    }

    let first_rows = UInt32Array::from(first_rows);
    let schema = table.schema();
    let mut fields = Vec::with_capacity(keys.len() + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(keys.len() + 1);
    for (key, column) in keys.iter().zip(&key_columns) {
        fields.push(Arc::new(schema.field_with_name(key)?.clone().with_nullable(true)));
        columns.push(take(column.as_ref(), &first_rows, None)?);
    }
    fields.push(Arc::new(Field::new(count_name, DataType::Int64, false)));
    columns.push(Arc::new(Int64Array::from(counts)));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Pivot one key of a grouped table into a count column per category
///
/// `grouped` is the output of [`group_count`] over `index` plus `pivot`. The
/// result has one row per distinct `index` combination, in first-appearance
/// order, and one Int64 column per entry of `categories`. A combination absent
/// from `grouped` counts as 0.
///
/// # Errors
///
/// [`UnknownCodeError`] if a pivot value is null or not in `categories`.
pub fn pivot_counts(
    grouped: &RecordBatch,
    index: &[&str],
    pivot: &str,
    categories: &[&str],
    count_name: &str,
) -> Result<RecordBatch> {
    if index.is_empty() {
        return Err(PipelineError::schema("pivot_counts needs at least one index key"));
    }

    let index_columns = index
        .iter()
        .map(|k| get_column(grouped, k))
        .collect::<Result<Vec<_>>>()?;
    let pivot_values = string_column(grouped, pivot)?;
    let counts = int64_column(grouped, count_name)?;

    let converter = RowConverter::new(
        index_columns
            .iter()
            .map(|c| SortField::new(c.data_type().clone()))
            .collect(),
    )?;
    let rows = converter.convert_columns(&index_columns)?;

    let mut groups = FxHashMap::default();
    let mut first_rows: Vec<u32> = Vec::new();
    let mut matrix: Vec<Vec<i64>> = Vec::new();
    for i in 0..rows.num_rows() {
        let category = category_position(&pivot_values, i, categories, pivot)?;
        let row = row_index(i)?;

        let group = *groups.entry(rows.row(i)).or_insert_with(|| {
            first_rows.push(row);
            matrix.push(vec![0; categories.len()]);
            matrix.len() - 1
        });
        matrix[group][category] += if counts.is_null(i) { 0 } else { counts.value(i) };
    }

    let first_rows = UInt32Array::from(first_rows);
    let schema = grouped.schema();
    let mut fields = Vec::with_capacity(index.len() + categories.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(index.len() + categories.len());
    for (key, column) in index.iter().zip(&index_columns) {
        fields.push(Arc::new(schema.field_with_name(key)?.clone().with_nullable(true)));
        columns.push(take(column.as_ref(), &first_rows, None)?);
    }
    for (c, category) in categories.iter().enumerate() {
        fields.push(Arc::new(Field::new(*category, DataType::Int64, false)));
        columns.push(Arc::new(Int64Array::from_iter_values(
            matrix.iter().map(|counts| counts[c]),
        )));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Lay a one-key grouped table out over a fixed list of categories
///
/// The result has exactly one row per category, in the given order, with 0
/// for categories missing from `grouped`.
///
/// # Errors
///
/// [`UnknownCodeError`] if `grouped` holds a key outside `categories`.
pub fn complete_categories(
    grouped: &RecordBatch,
    key: &str,
    categories: &[&str],
    count_name: &str,
) -> Result<RecordBatch> {
    let keys = string_column(grouped, key)?;
    let counts = int64_column(grouped, count_name)?;

    let mut totals = vec![0_i64; categories.len()];
    for i in 0..grouped.num_rows() {
        let position = category_position(&keys, i, categories, key)?;
        totals[position] += if counts.is_null(i) { 0 } else { counts.value(i) };
    }

    let schema = Schema::new(vec![
        Field::new(key, DataType::Utf8, false),
        Field::new(count_name, DataType::Int64, false),
    ]);
    Ok(RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(categories.to_vec())) as ArrayRef,
            Arc::new(Int64Array::from(totals)) as ArrayRef,
        ],
    )?)
}

/// Index of row `i`'s value in `categories`
fn category_position(
    values: &StringArray,
    i: usize,
    categories: &[&str],
    column: &str,
) -> std::result::Result<usize, UnknownCodeError> {
    if values.is_null(i) {
        return Err(UnknownCodeError {
            column: column.to_string(),
            code: "null".to_string(),
        });
    }
    let value = values.value(i);
    categories
        .iter()
        .position(|c| *c == value)
        .ok_or_else(|| UnknownCodeError {
            column: column.to_string(),
            code: value.to_string(),
        })
}

/// Sort a table by one column, nulls last
pub fn sort_by_column(table: &RecordBatch, column: &str, ascending: bool) -> Result<RecordBatch> {
    let values = get_column(table, column)?;
    let indices = sort_to_indices(
        values.as_ref(),
        Some(SortOptions {
            descending: !ascending,
            nulls_first: false,
        }),
        None,
    )?;
    Ok(take_record_batch(table, &indices)?)
}

/// Sum of a count column
pub fn total_count(table: &RecordBatch, count_name: &str) -> Result<i64> {
    let counts = int64_column(table, count_name)?;
    Ok(counts.iter().flatten().sum())
}
