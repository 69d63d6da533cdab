//! Join key normalization.
//!
//! Department names differ in case and spacing between DIVIPOLA and the
//! boundary file ("RISARALDA" vs "Risaralda"), and municipality codes lose
//! their leading zeros when a sheet stores them as numbers. Both sides of a
//! join must go through the same function here.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::Result;
use crate::utils::arrow::{string_column, with_column};

/// Canonical form of a free-text key: trimmed, single-spaced, lower-case
#[must_use]
pub fn normalize_key(value: &str) -> String {
    value.split_whitespace().join(" ").to_lowercase()
}

/// Left-pad a numeric code with zeros to `width` digits
///
/// Codes containing anything but ASCII digits are only trimmed.
#[must_use]
pub fn pad_code(value: &str, width: usize) -> String {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        format!("{trimmed:0>width$}")
    } else {
        trimmed.to_string()
    }
}

/// Apply [`normalize_key`] to every value of a column, keeping nulls
pub fn normalize_key_column(batch: &RecordBatch, column: &str) -> Result<ArrayRef> {
    let values = string_column(batch, column)?;
    let normalized: StringArray = values.iter().map(|v| v.map(normalize_key)).collect();
    Ok(Arc::new(normalized))
}

/// Return `batch` with `column` replaced by its normalized form
pub fn normalize_column(batch: &RecordBatch, column: &str) -> Result<RecordBatch> {
    let normalized = normalize_key_column(batch, column)?;
    with_column(batch, column, normalized)
}

/// Return `batch` with the codes in `column` padded to `width`
pub fn pad_code_column(batch: &RecordBatch, column: &str, width: usize) -> Result<RecordBatch> {
    let values = string_column(batch, column)?;
    let padded: StringArray = values.iter().map(|v| v.map(|c| pad_code(c, width))).collect();
    with_column(batch, column, Arc::new(padded))
}
