//! Error types for archive operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the archive error type
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Archive container and naming errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// File name does not have the `{label}-{timestamp}.tgz` form
    #[error("Archive file name '{filename}' has an invalid format")]
    InvalidFilename { filename: String },

    /// File name belongs to another label
    #[error("Archive file name '{filename}' does not match label '{expected}'")]
    LabelMismatch { filename: String, expected: String },

    /// Write attempted before the container was opened
    #[error("Archive {name} is not open")]
    NotOpen { name: String },

    /// Container opened twice
    #[error("Archive {name} is already open")]
    AlreadyOpen { name: String },

    /// Operation attempted on a closed container
    #[error("Archive {name} is already closed")]
    Closed { name: String },

    /// Filesystem path to add does not exist
    #[error("Path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
