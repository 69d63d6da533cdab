//! Error handling for the mortality pipeline.
//!
//! Every error here is fatal to pipeline construction: a run either yields the
//! complete set of views or one of these errors.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// A source table could not be located, read, or conformed to its schema.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source path does not exist
    #[error("source not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The source exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A sheet export is missing from the source
    #[error("sheet '{sheet}' not found in {}", path.display())]
    MissingSheet { path: PathBuf, sheet: String },

    /// The table lacks a required column
    #[error("column '{column}' is missing from the {table} table")]
    MissingColumn { table: String, column: String },

    /// A column exists but cannot be read as the expected type
    #[error("column '{column}' in the {table} table cannot be read as {expected}: {reason}")]
    IncompatibleColumn {
        table: String,
        column: String,
        expected: String,
        reason: String,
    },

    /// The Parquet file is malformed
    #[error("parquet error in {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: ParquetError,
    },

    /// Decoding batches from a Parquet file failed
    #[error("failed to decode record batches from {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ArrowError,
    },

    /// A JSON document (boundary GeoJSON or configuration) is malformed
    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The right-hand side of a join has more than one row for a key value.
///
/// Joining against such a table would multiply the counts of every matching row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("join key ({key}) is not unique: value '{value}' appears {occurrences} times")]
pub struct JoinCardinalityError {
    pub key: String,
    pub value: String,
    pub occurrences: usize,
}

/// A derived field could not be computed from its source value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivationError {
    #[error("month {month} is outside 1-12")]
    InvalidMonth { month: i64 },

    #[error("year '{value}' is missing or not numeric")]
    InvalidYear { value: String },

    #[error("age '{value}' is not numeric")]
    NonNumericAge { value: String },

    #[error("age {age} is outside 0-100")]
    AgeOutOfRange { age: i64 },

    #[error("value in column '{column}' is missing")]
    MissingValue { column: String },

    #[error("row {row}: {source}")]
    InRow {
        row: usize,
        #[source]
        source: Box<DerivationError>,
    },
}

impl DerivationError {
    /// Attach the row index the error was found at
    #[must_use]
    pub fn at_row(self, row: usize) -> Self {
        Self::InRow {
            row,
            source: Box::new(self),
        }
    }
}

/// A closed-set code (sex code, pivot category) is outside the known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown code '{code}' in column '{column}'")]
pub struct UnknownCodeError {
    pub column: String,
    pub code: String,
}

/// Top-level error for pipeline construction
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    JoinCardinality(#[from] JoinCardinalityError),

    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error(transparent)]
    UnknownCode(#[from] UnknownCodeError),

    /// An in-memory table does not match the columns an operation expects
    #[error("schema error: {0}")]
    Schema(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// A view could not be converted into typed rows
    #[error("row conversion error: {0}")]
    Conversion(#[from] serde_arrow::Error),

    /// A view's total disagrees with the number of source records
    #[error("view '{view}' counts {actual} records but the registry holds {expected}")]
    Inconsistent {
        view: &'static str,
        expected: i64,
        actual: i64,
    },
}

impl PipelineError {
    /// Create a schema error from a message
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
