//! Target abstraction and operation results

use crate::error::StorageError;
use async_trait::async_trait;
use sitebackup_archive::{Archive, ArchiveId};
use sitebackup_core::report::Reportable;
use sitebackup_core::thinning::Decision;
use sitebackup_core::utils::{format_bytes, format_duration};
use std::fmt;
use std::time::Duration;

/// Decides which of the listed archives to keep
pub type DecideFn<'a> = dyn Fn(Vec<ArchiveId>) -> Decision<ArchiveId> + Send + Sync + 'a;

/// Storage destination for archives
#[async_trait]
pub trait Target: Reportable + Send + Sync {
    /// Short label, e.g. `S3`
    fn label(&self) -> &str;

    /// Human description used in status lines and mail
    fn description(&self) -> String;

    /// Archives currently stored, restricted to `label` when given
    async fn list_archives(&self, label: Option<&str>) -> Result<Vec<ArchiveId>, StorageError>;

    /// Store a closed archive; a dry run writes nothing and reports zero
    async fn transfer_archive(
        &mut self,
        archive: &Archive,
        dry_run: bool,
    ) -> Result<TransferResult, StorageError>;

    /// Delete the archives of `label` that `decide` discards
    ///
    /// A dry run computes the same split but deletes nothing.
    async fn perform_thinning(
        &mut self,
        label: &str,
        decide: &DecideFn<'_>,
        dry_run: bool,
    ) -> Result<ThinningResult, StorageError>;
}

/// Outcome of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferResult {
    pub size: u64,
    pub duration: Duration,
}

impl fmt::Display for TransferResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Result(size={}, duration={})",
            format_bytes(self.size),
            format_duration(self.duration)
        )
    }
}

/// Outcome of a thinning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThinningResult {
    pub retained: usize,
    pub deleted: usize,
}

impl fmt::Display for ThinningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Result(retained={}, deleted={})",
            self.retained, self.deleted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_display() {
        assert_eq!(
            ThinningResult {
                retained: 10,
                deleted: 3
            }
            .to_string(),
            "Result(retained=10, deleted=3)"
        );
        assert_eq!(
            TransferResult {
                size: 512,
                duration: Duration::from_millis(250),
            }
            .to_string(),
            "Result(size=512 B, duration=250 ms)"
        );
    }
}
