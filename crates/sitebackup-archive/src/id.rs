//! Archive identity and file name round trip

use crate::error::{ArchiveError, Result};
use chrono::NaiveDateTime;
use sitebackup_core::thinning::Timestamped;
use sitebackup_core::utils::{format_timestamp, parse_timestamp};
use std::fmt;

/// File extension of archive files
pub const ARCHIVE_EXTENSION: &str = "tgz";

/// Label and creation time identifying one archive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveId {
    label: String,
    timestamp: String,
    created: NaiveDateTime,
}

impl ArchiveId {
    /// Identify an archive of `label` created at `created`
    pub fn new(label: impl Into<String>, created: NaiveDateTime) -> Self {
        Self {
            label: label.into(),
            timestamp: format_timestamp(&created),
            created,
        }
    }

    /// Parse an archive file name such as `site-20240101123456.tgz`
    ///
    /// The label is everything before the last `-`. When `expected_label`
    /// is given a different label yields [`ArchiveError::LabelMismatch`].
    pub fn parse(filename: &str, expected_label: Option<&str>) -> Result<Self> {
        let invalid = || ArchiveError::InvalidFilename {
            filename: filename.to_string(),
        };

        let stem = filename
            .strip_suffix(ARCHIVE_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(invalid)?;
        let (label, timestamp) = stem.rsplit_once('-').ok_or_else(invalid)?;
        if label.is_empty() {
            return Err(invalid());
        }
        let created = parse_timestamp(timestamp).map_err(|_| invalid())?;

        if let Some(expected) = expected_label {
            if label != expected {
                return Err(ArchiveError::LabelMismatch {
                    filename: filename.to_string(),
                    expected: expected.to_string(),
                });
            }
        }

        Ok(Self {
            label: label.to_string(),
            timestamp: timestamp.to_string(),
            created,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 14-digit `YYYYMMDDhhmmss` timestamp
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn created(&self) -> NaiveDateTime {
        self.created
    }

    /// `{label}-{timestamp}`, also used as the top level directory inside the archive
    pub fn name(&self) -> String {
        format!("{}-{}", self.label, self.timestamp)
    }

    /// `{label}-{timestamp}.tgz`
    pub fn filename(&self) -> String {
        format!("{}.{}", self.name(), ARCHIVE_EXTENSION)
    }
}

impl Timestamped for ArchiveId {
    fn timestamp(&self) -> NaiveDateTime {
        self.created
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename())
    }
}
