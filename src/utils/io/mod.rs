//! IO utilities for file operations

pub mod parquet;

// Re-export commonly used functions for convenience
pub use parquet::{write_batch, write_views};
