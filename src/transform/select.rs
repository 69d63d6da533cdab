//! Row selection: rankings and equality filters.

use std::cmp::Ordering;

use arrow::array::{Array, BooleanArray, UInt32Array};
use arrow::compute::{filter_record_batch, take_record_batch};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils::arrow::{int64_column, row_index, string_column};

/// The `n` rows with the highest values in `by`
///
/// Ties keep the table's existing row order. Returns every row when the table
/// has fewer than `n`.
pub fn top_n(table: &RecordBatch, by: &str, n: usize) -> Result<RecordBatch> {
    select_n(table, by, n, true)
}

/// The `n` rows with the lowest values in `by`
///
/// Same tie-break as [`top_n`].
pub fn bottom_n(table: &RecordBatch, by: &str, n: usize) -> Result<RecordBatch> {
    select_n(table, by, n, false)
}

fn select_n(table: &RecordBatch, by: &str, n: usize, descending: bool) -> Result<RecordBatch> {
    let values = int64_column(table, by)?;

    let mut order: Vec<usize> = (0..table.num_rows()).collect();
    // sort_by is stable, so equal values keep their row order
    order.sort_by(|&a, &b| {
        match (values.is_null(a), values.is_null(b)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = values.value(a).cmp(&values.value(b));
                if descending { ord.reverse() } else { ord }
            }
        }
    });
    order.truncate(n);

    let indices = order
        .into_iter()
        .map(row_index)
        .collect::<Result<Vec<_>>>()?;
    Ok(take_record_batch(table, &UInt32Array::from(indices))?)
}

/// Rows whose `column` equals `value` exactly
///
/// Non-text columns are compared on their text rendering. Nulls never match.
pub fn filter_equals(table: &RecordBatch, column: &str, value: &str) -> Result<RecordBatch> {
    let values = string_column(table, column)?;
    let mask: BooleanArray = values.iter().map(|v| Some(v == Some(value))).collect();
    Ok(filter_record_batch(table, &mask)?)
}
