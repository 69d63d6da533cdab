//! Aggregate mortality views built from a national death registry export.
//!
//! The death records and the DIVIPOLA municipality lookup are read from
//! Parquet, the department boundaries from GeoJSON. [`run_pipeline`] joins,
//! derives and aggregates them into the [`MortalityViews`] bundle.

pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod utils;

// Re-export the most common types for easier use
pub use config::{AgePolicy, BoundarySource, PipelineConfig, TableSource, ViewOptions};
pub use error::{
    DerivationError, JoinCardinalityError, LoadError, PipelineError, Result, UnknownCodeError,
};
pub use loader::{SourceTables, load_sources};
pub use pipeline::{MortalityViews, run_pipeline};

// Arrow types
pub use arrow::record_batch::RecordBatch;
