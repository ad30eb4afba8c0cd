//! sitebackup archive builder
//!
//! This crate provides the archive container used by a backup run.
//! An archive is identified by a label and a 14-digit timestamp and is
//! written as a gzip compressed tar file named `{label}-{timestamp}.tgz`.
//!
//! # Features
//!
//! - **Name round trip**: [`ArchiveId`] renders and parses archive file names
//! - **Scoped lifetime**: entries can only be added between `open` and `close`
//! - **In-memory entries**: [`ArchiveEntry`] buffers generated content such as database dumps
//! - **Manifest**: a one line `MANIFEST` entry carrying the archive timestamp
//! - **Checksums**: SHA256 of the finished container is recorded on close
//!
//! # Examples
//!
//! ```no_run
//! use sitebackup_archive::Archive;
//! use std::path::Path;
//!
//! fn main() -> Result<(), sitebackup_archive::ArchiveError> {
//!     let mut archive = Archive::new("my-blog");
//!     archive.open()?;
//!
//!     let mut entry = archive.create_entry("notes.txt", false);
//!     entry.write_line("hello")?;
//!     archive.add_entry(entry)?;
//!     archive.add_path(Path::new("/var/www/blog"), "my-blog")?;
//!     let timestamp = archive.id().timestamp().to_string();
//!     archive.add_manifest(&timestamp)?;
//!
//!     let result = archive.close()?;
//!     println!("Archive created: {} bytes", result.size);
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod compression;
pub mod entry;
pub mod error;
pub mod id;
pub mod manifest;

// Re-export commonly used types
pub use archive::{Archive, ArchiveResult};
pub use compression::{calculate_checksum, DEFAULT_COMPRESSION_LEVEL};
pub use entry::ArchiveEntry;
pub use error::{ArchiveError, Result};
pub use id::{ArchiveId, ARCHIVE_EXTENSION};
pub use manifest::MANIFEST_FILENAME;
