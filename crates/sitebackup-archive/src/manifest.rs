//! Manifest entry stored in every archive.
//!
//! The manifest is a plain text file named `MANIFEST` holding a single
//! `Timestamp: {timestamp}` line.

use crate::entry::ArchiveEntry;
use std::io;

/// Name of the manifest entry inside an archive.
pub const MANIFEST_FILENAME: &str = "MANIFEST";

/// Builds the manifest entry for an archive timestamp.
pub fn manifest_entry(timestamp: &str) -> io::Result<ArchiveEntry> {
    let mut entry = ArchiveEntry::new(MANIFEST_FILENAME, false);
    entry.write_line(format!("Timestamp: {timestamp}"))?;
    Ok(entry)
}

/// Extracts the timestamp from manifest content.
pub fn parse_manifest(content: &str) -> Option<&str> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("Timestamp: "))
        .map(str::trim)
}
