//! Derived fields computed before aggregation.
//!
//! * month dates from the separate year and month columns
//! * 5-year age bands from the age-group text
//! * display labels for sex codes

use std::sync::Arc;

use arrow::array::{Array, Date32Array, StringArray};
use arrow::datatypes::Date32Type;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::config::AgePolicy;
use crate::error::{DerivationError, Result, UnknownCodeError};
use crate::utils::arrow::{int64_column, string_column, with_column};

/// Labels of the twenty 5-year age bands, in order
///
/// The last band is closed at 100.
pub const AGE_BANDS: [&str; 20] = [
    "0-4", "5-9", "10-14", "15-19", "20-24", "25-29", "30-34", "35-39", "40-44", "45-49",
    "50-54", "55-59", "60-64", "65-69", "70-74", "75-79", "80-84", "85-89", "90-94", "95-100",
];

/// Band for ages that cannot be placed when [`AgePolicy::Bucket`] is used
pub const UNKNOWN_AGE_BAND: &str = "Desconocido";

/// Oldest age covered by [`AGE_BANDS`]
pub const MAX_AGE: i64 = 100;

/// Sex codes used by the registry and their labels
pub const SEX_LABELS: [(i64, &str); 3] = [(1, "Masculino"), (2, "Femenino"), (3, "Indeterminado")];

/// First day of the given month
pub fn month_start(year: i64, month: i64) -> std::result::Result<NaiveDate, DerivationError> {
    if !(1..=12).contains(&month) {
        return Err(DerivationError::InvalidMonth { month });
    }
    let year = i32::try_from(year).map_err(|_| DerivationError::InvalidYear {
        value: year.to_string(),
    })?;
    // month is known to be 1-12 here
    NaiveDate::from_ymd_opt(year, month as u32, 1).ok_or_else(|| DerivationError::InvalidYear {
        value: year.to_string(),
    })
}

/// Append a Date32 column holding the first day of each row's month
pub fn derive_month_column(
    batch: &RecordBatch,
    year_column: &str,
    month_column: &str,
    output_column: &str,
) -> Result<RecordBatch> {
    let years = int64_column(batch, year_column)?;
    let months = int64_column(batch, month_column)?;

    let mut days = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        if years.is_null(row) {
            return Err(DerivationError::InvalidYear {
                value: "null".to_string(),
            }
            .at_row(row)
            .into());
        }
        if months.is_null(row) {
            return Err(DerivationError::MissingValue {
                column: month_column.to_string(),
            }
            .at_row(row)
            .into());
        }
        let date = month_start(years.value(row), months.value(row)).map_err(|e| e.at_row(row))?;
        days.push(Date32Type::from_naive_date(date));
    }

    with_column(batch, output_column, Arc::new(Date32Array::from(days)))
}

/// Parse an age from the age-group text, stripping a trailing unit word
///
/// `"30 años"`, `"30años"` and `"30"` all parse as 30.
pub fn parse_age(raw: &str) -> std::result::Result<i64, DerivationError> {
    let number = raw.trim().trim_end_matches(char::is_alphabetic).trim_end();
    number
        .parse::<i64>()
        .map_err(|_| DerivationError::NonNumericAge {
            value: raw.to_string(),
        })
}

/// Label of the 5-year band containing `age`
pub fn age_band(age: i64) -> std::result::Result<&'static str, DerivationError> {
    if !(0..=MAX_AGE).contains(&age) {
        return Err(DerivationError::AgeOutOfRange { age });
    }
    let idx = usize::try_from(age / 5).unwrap_or(AGE_BANDS.len() - 1);
    Ok(AGE_BANDS[idx.min(AGE_BANDS.len() - 1)])
}

/// Band label for raw age-group text
pub fn age_band_for(raw: &str) -> std::result::Result<&'static str, DerivationError> {
    parse_age(raw).and_then(age_band)
}

/// Append a column with the age band of every row
///
/// With [`AgePolicy::Reject`] the first unplaceable age fails the call; with
/// [`AgePolicy::Bucket`] such rows get [`UNKNOWN_AGE_BAND`].
pub fn derive_age_band_column(
    batch: &RecordBatch,
    age_column: &str,
    output_column: &str,
    policy: AgePolicy,
) -> Result<RecordBatch> {
    let ages = string_column(batch, age_column)?;

    let mut bands = Vec::with_capacity(batch.num_rows());
    for (row, raw) in ages.iter().enumerate() {
        let band = match raw {
            Some(raw) => age_band_for(raw),
            None => Err(DerivationError::MissingValue {
                column: age_column.to_string(),
            }),
        };
        match (band, policy) {
            (Ok(label), _) => bands.push(label),
            (Err(_), AgePolicy::Bucket) => bands.push(UNKNOWN_AGE_BAND),
            (Err(e), AgePolicy::Reject) => return Err(e.at_row(row).into()),
        }
    }

    with_column(batch, output_column, Arc::new(StringArray::from(bands)))
}

/// Display label for a sex code
pub fn sex_label(code: i64) -> std::result::Result<&'static str, UnknownCodeError> {
    SEX_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .ok_or_else(|| UnknownCodeError {
            column: crate::schema::columns::SEX.to_string(),
            code: code.to_string(),
        })
}

/// Labels of all sex codes, in code order
#[must_use]
pub fn sex_labels() -> Vec<&'static str> {
    SEX_LABELS.iter().map(|(_, label)| *label).collect()
}

/// Write the label of each sex code into `output_column`
///
/// `output_column` may equal `code_column` to replace the codes.
pub fn derive_sex_label_column(
    batch: &RecordBatch,
    code_column: &str,
    output_column: &str,
) -> Result<RecordBatch> {
    let codes = int64_column(batch, code_column)?;

    let labels = codes
        .iter()
        .map(|code| {
            let code = code.ok_or_else(|| UnknownCodeError {
                column: code_column.to_string(),
                code: "null".to_string(),
            })?;
            sex_label(code).map_err(|e| UnknownCodeError {
                column: code_column.to_string(),
                ..e
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    with_column(batch, output_column, Arc::new(StringArray::from(labels)))
}
