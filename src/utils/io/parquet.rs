//! Parquet output
//!
//! The built views can be written next to each other in one directory, one
//! Parquet file per view named after the view.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::pipeline::MortalityViews;
use crate::utils::logging::log_warning;

/// Write a single record batch to a Parquet file
pub fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("Failed to create parquet writer for {}", path.display()))?;
    writer
        .write(batch)
        .with_context(|| format!("Failed to write batch to {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("Failed to finish parquet file {}", path.display()))?;

    Ok(())
}

/// Write every view to `<dir>/<view name>.parquet`
///
/// The directory is created if needed. Returns the written paths in view order.
pub fn write_views(views: &MortalityViews, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut written = Vec::with_capacity(MortalityViews::NAMES.len());
    for (name, view) in views.iter() {
        if view.num_rows() == 0 {
            log_warning(&format!("View {name} is empty"), None);
        }
        let path = dir.join(format!("{name}.parquet"));
        write_batch(&path, view)?;
        log::info!("Wrote {} rows to {}", view.num_rows(), path.display());
        written.push(path);
    }
    Ok(written)
}
