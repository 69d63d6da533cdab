//! Arrow data handling utilities
//!
//! Helpers for looking up, downcasting and replacing columns of record batches.

pub mod array_utils;

// Re-export commonly used functions for convenience
pub use array_utils::{
    downcast_array, get_column, int64_column, row_index, string_column, with_column,
    without_columns,
};
