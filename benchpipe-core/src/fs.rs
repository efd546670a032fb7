//! Scoped Text-File Access
//!
//! Thin wrappers over `std::fs` that guarantee the handle is closed on every
//! exit path (including errors) and attach the offending path to the error.
//! A missing file is an error here, never an empty-string default.

use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// File-access failures, tagged with the operation and path.
#[derive(Debug, Error)]
pub enum FileError {
    /// Open/read failure, including a missing file.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Open/write failure.
    #[error("failed to write '{path}': {source}")]
    Write {
        /// Path that failed to write.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Read `path` to end-of-stream and return the accumulated text.
pub fn read_all(path: impl AsRef<Path>) -> Result<String, FileError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading file");
    fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Write the full payload to `path`, truncating any existing content.
pub fn write_all(path: impl AsRef<Path>, text: &str) -> Result<(), FileError> {
    let path = path.as_ref();
    debug!(path = %path.display(), bytes = text.len(), "writing file");
    fs::write(path, text).map_err(|source| FileError::Write {
        path: path.display().to_string(),
        source,
    })
}
