//! Utility functions for error handling
//!
//! File access helpers that turn `std::io` failures into [`LoadError`]s
//! carrying the offending path.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::LoadError;

/// Open a file, reporting a missing path or a non-file as a [`LoadError`]
pub fn safe_open_file(path: &Path) -> Result<fs::File, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    if !path.is_file() {
        return Err(LoadError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path is not a file"),
        });
    }

    fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a whole file into a string
pub fn safe_read_to_string(path: &Path) -> Result<String, LoadError> {
    let mut file = safe_open_file(path)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content)
}
