//! S3 target

use super::store::ObjectStore;
use crate::error::StorageError;
use crate::progress::UploadProgress;
use crate::traits::{DecideFn, Target, ThinningResult, TransferResult};
use async_trait::async_trait;
use sitebackup_archive::{Archive, ArchiveError, ArchiveId};
use sitebackup_core::report::{Journal, Reportable};
use sitebackup_core::utils::{format_bytes, format_kv};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const LABEL: &str = "S3";

/// Stores archives as objects named by their file name in one bucket
pub struct S3Target {
    host: String,
    bucket: String,
    store: Arc<dyn ObjectStore>,
    show_progress: bool,
    journal: Journal,
}

impl S3Target {
    pub fn new(host: impl Into<String>, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            host: host.into(),
            bucket: bucket.into(),
            store,
            show_progress: false,
            journal: Journal::new(),
        }
    }

    /// Show a spinner while uploading
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn ensure_bucket(&self, dry_run: bool) -> Result<(), StorageError> {
        if self.store.bucket_exists(&self.bucket).await? {
            return Ok(());
        }
        if dry_run {
            info!("Bucket {} does not exist (dry run, not created)", self.bucket);
            return Ok(());
        }
        info!("Creating bucket: {}", self.bucket);
        self.store.create_bucket(&self.bucket).await
    }

    async fn transfer(&self, archive: &Archive, dry_run: bool) -> Result<TransferResult, StorageError> {
        self.ensure_bucket(dry_run).await?;

        if dry_run {
            info!("Dry run: skipping upload of {}", archive.filename());
            return Ok(TransferResult::default());
        }

        let filename = archive.filename();
        let progress = UploadProgress::start(
            &format!("Uploading {filename} to {}", self.description()),
            self.show_progress,
        );
        let started = Instant::now();

        let size = match self.store.put_file(&self.bucket, &filename, &archive.path()).await {
            Ok(size) => size,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };

        let result = TransferResult {
            size,
            duration: started.elapsed(),
        };
        progress.finish(&format!("Uploaded {filename} ({})", format_bytes(size)));
        info!("Transferred {} to s3://{}/{}: {}", filename, self.bucket, filename, result);
        Ok(result)
    }

    async fn thin(
        &self,
        label: &str,
        decide: &DecideFn<'_>,
        dry_run: bool,
    ) -> Result<ThinningResult, StorageError> {
        let archives = self.list_archives(Some(label)).await?;
        let decision = decide(archives);

        if dry_run {
            info!(
                "Dry run: would delete {} of {} archives",
                decision.discard.len(),
                decision.len()
            );
        } else {
            for archive in &decision.discard {
                debug!("Deleting s3://{}/{}", self.bucket, archive.filename());
                self.store.delete(&self.bucket, &archive.filename()).await?;
            }
        }

        Ok(ThinningResult {
            retained: decision.keep.len(),
            deleted: decision.discard.len(),
        })
    }
}

#[async_trait]
impl Target for S3Target {
    fn label(&self) -> &str {
        LABEL
    }

    fn description(&self) -> String {
        format!("{LABEL} Service at {}", self.host)
    }

    async fn list_archives(&self, label: Option<&str>) -> Result<Vec<ArchiveId>, StorageError> {
        let keys = self.store.list_keys(&self.bucket).await?;

        let mut archives = Vec::new();
        for key in keys {
            match ArchiveId::parse(&key, label) {
                Ok(id) => archives.push(id),
                Err(ArchiveError::LabelMismatch { .. }) => {}
                Err(e) => warn!("Ignoring object {} in bucket {}: {}", key, self.bucket, e),
            }
        }
        Ok(archives)
    }

    async fn transfer_archive(
        &mut self,
        archive: &Archive,
        dry_run: bool,
    ) -> Result<TransferResult, StorageError> {
        let result = self.transfer(archive, dry_run).await;
        self.journal.observe("TRANSFER ARCHIVE", result)
    }

    async fn perform_thinning(
        &mut self,
        label: &str,
        decide: &DecideFn<'_>,
        dry_run: bool,
    ) -> Result<ThinningResult, StorageError> {
        let result = self.thin(label, decide, dry_run).await;
        self.journal.observe("PERFORM THINNING", result)
    }
}

impl Reportable for S3Target {
    fn summary(&self) -> String {
        format_kv(
            Some(LABEL),
            &[("S3(Host)", self.host.as_str()), ("S3(Bucket)", self.bucket.as_str())],
        )
    }

    fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl fmt::Debug for S3Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Target")
            .field("host", &self.host)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}
