//! Error types for sources and their collaborators

use crate::types::SourceKind;
use std::path::PathBuf;
use thiserror::Error;

/// No source variant matched the directory
#[derive(Error, Debug)]
pub enum SourceError {
    /// Every probe failed; failures are listed in probe order
    #[error("No supported application found at {}:\n{}", path.display(), format_failures(failures))]
    NoMatch {
        path: PathBuf,
        failures: Vec<ProbeError>,
    },
}

fn format_failures(failures: &[ProbeError]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Failure of a single source variant probe
#[derive(Error, Debug)]
#[error("{kind}: {reason}")]
pub struct ProbeError {
    pub kind: SourceKind,
    #[source]
    pub reason: ProbeFailure,
}

impl ProbeError {
    pub fn new(kind: SourceKind, reason: ProbeFailure) -> Self {
        Self { kind, reason }
    }

    /// True when the variant's configuration file does not exist at all
    pub fn is_not_found(&self) -> bool {
        matches!(self.reason, ProbeFailure::NotFound { .. })
    }
}

/// Why a source variant was rejected
#[derive(Error, Debug)]
pub enum ProbeFailure {
    /// Expected configuration file is missing
    #[error("no installation found ({} missing)", config.display())]
    NotFound { config: PathBuf },

    /// Configuration file could not be read or understood
    #[error("invalid configuration in {}: {message}", config.display())]
    InvalidConfig { config: PathBuf, message: String },

    /// A database parameter required for identification is not set
    #[error("database parameter {parameter} not set")]
    MissingParameter { parameter: &'static str },

    /// Identification query returned no row
    #[error("no result for query: {query}")]
    MissingRow { query: String },

    /// Database query failed
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Database access errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Credentials were rejected by the server
    #[error("Database access denied: {message}")]
    AccessDenied { message: String },

    /// Query or dump failed
    #[error("Database query failed: {message}")]
    Query { message: String },

    /// The database holds no tables matching the prefix
    #[error("No tables to dump in database {database}")]
    NoTables { database: String },

    /// The source does not provide a required parameter
    #[error("Database parameter {parameter} not configured")]
    NotConfigured { parameter: &'static str },

    /// Client tool could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Buffering the dump failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the dump into the archive failed
    #[error(transparent)]
    Archive(#[from] sitebackup_archive::ArchiveError),
}

impl DatabaseError {
    /// True when the failure is a rejected login
    pub fn is_access_denied(&self) -> bool {
        matches!(self, DatabaseError::AccessDenied { .. })
    }
}

/// Filesystem backup errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Path to back up does not exist
    #[error("Path '{}' not found", path.display())]
    NotFound { path: PathBuf },

    /// Adding the tree to the archive failed
    #[error(transparent)]
    Archive(#[from] sitebackup_archive::ArchiveError),
}
