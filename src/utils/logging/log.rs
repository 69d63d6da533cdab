//! Logging utilities
//!
//! Standard messages for loading tables and building views.

use std::path::Path;
use std::time::Duration;

/// Log the start of loading a source table
pub fn log_load_start(table: &str, path: &Path) {
    log::info!("Loading {table} table from {}", path.display());
}

/// Log a completed table load
///
/// # Arguments
/// * `table` - Name of the table that was loaded
/// * `path` - Path the table was read from
/// * `rows` - Number of rows loaded
/// * `elapsed` - Optional elapsed time
pub fn log_load_complete(table: &str, path: &Path, rows: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!(
            "Loaded {rows} {table} rows from {} in {duration:?}",
            path.display()
        );
    } else {
        log::info!("Loaded {rows} {table} rows from {}", path.display());
    }
}

/// Log a finished view
pub fn log_view_built(view: &str, rows: usize) {
    log::debug!("Built view {view} with {rows} rows");
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{message}: {}", path.display());
    } else {
        log::warn!("{message}");
    }
}
