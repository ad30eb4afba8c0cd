//! Backup run orchestration
//!
//! A [`Backup`] drives one run for a resolved [`Source`]:
//!
//! ```text
//! Idle → SourceResolved → [ArchiveBuilding → ArchiveClosed → Transferred]
//!      → [Thinned] → Cleaned → Reported → Done
//! ```
//!
//! Archive building is skipped when neither the database nor the filesystem
//! was requested; thinning is skipped without a strategy. Any error removes
//! the local archive and still sends the report before the run ends in the
//! terminal `Failed` state.

use crate::calendar::Calendar;
use crate::mail::{Attachment, Mailer, Message, Priority};
use crate::output;
use chrono::{NaiveDate, NaiveDateTime};
use sitebackup_archive::{Archive, ArchiveError, ArchiveId};
use sitebackup_core::report::{render_report, Journal, Outcome, Reportable};
use sitebackup_core::thinning::ThinningStrategy;
use sitebackup_core::utils::{self, format_duration, format_kv};
use sitebackup_sources::{Database, DatabaseError, Filesystem, FilesystemError, Source, SqlClient};
use sitebackup_targets::{StorageError, Target};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors ending a backup run
#[derive(Error, Debug)]
pub enum BackupError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Progress of a run
///
/// `Done` and `Failed` are terminal. A failed run has already attempted its
/// report when it reaches `Failed`; it does not pass through `Reported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SourceResolved,
    ArchiveBuilding,
    ArchiveClosed,
    Transferred,
    Thinned,
    Cleaned,
    Reported,
    Done,
    Failed,
}

impl RunState {
    /// No further transitions follow
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// What a run does
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Dump the database into the archive
    pub database: bool,

    /// Add the installation directory to the archive
    pub filesystem: bool,

    pub thinning: Option<ThinningStrategy>,

    /// Keep the archive in this directory instead of deleting it
    pub attic: Option<PathBuf>,

    /// Store and delete nothing on the targets
    pub dry_run: bool,

    /// Directory the archive is written to
    pub work_dir: PathBuf,

    /// Fixed "now" for thinning decisions; the current time when unset
    pub reference_time: Option<NaiveDateTime>,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            database: false,
            filesystem: false,
            thinning: None,
            attic: None,
            dry_run: false,
            work_dir: PathBuf::from("."),
            reference_time: None,
        }
    }
}

#[derive(Default)]
struct Participants {
    database: Option<Database>,
    filesystem: Option<Filesystem>,
    archive: Option<Archive>,
}

/// One backup run of a source
pub struct Backup {
    source: Source,
    client: Arc<dyn SqlClient>,
    mailer: Option<Mailer>,
    quiet: bool,
    state: RunState,
    elapsed: Duration,
    error: Option<String>,
    journal: Journal,
    parts: Participants,
}

impl Backup {
    pub fn new(source: Source, client: Arc<dyn SqlClient>) -> Self {
        Self {
            source,
            client,
            mailer: None,
            quiet: false,
            state: RunState::Idle,
            elapsed: Duration::ZERO,
            error: None,
            journal: Journal::new(),
            parts: Participants::default(),
        }
    }

    pub fn with_mailer(mut self, mailer: Option<Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Suppress status lines and the printed report
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Error that ended the run, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Archive created by the run
    pub fn archive(&self) -> Option<&Archive> {
        self.parts.archive.as_ref()
    }

    /// Execute the run against `targets`
    pub async fn execute(
        &mut self,
        targets: &mut [Box<dyn Target>],
        options: &BackupOptions,
    ) -> Result<(), BackupError> {
        self.journal.record_parameter("EXECUTE", "dry", options.dry_run);
        self.journal.record_parameter("EXECUTE", "database", options.database);
        self.journal.record_parameter("EXECUTE", "filesystem", options.filesystem);
        self.journal.record_parameter(
            "EXECUTE",
            "thinning",
            options.thinning.map_or_else(|| "None".to_string(), |t| t.to_string()),
        );

        self.transition(RunState::SourceResolved);
        let started = Instant::now();
        let result = self.run(targets, options).await;
        self.elapsed = started.elapsed();

        match result {
            Ok(()) => {
                self.journal.record("EXECUTE", Outcome::Success("OK".to_string()));
                let today = options.reference_time.unwrap_or_else(utils::now).date();
                let attachments = match &self.mailer {
                    Some(mailer) if mailer.is_serviceable() => self.calendars(targets, today).await,
                    _ => Vec::new(),
                };
                self.send_report(targets, attachments).await;
                self.transition(RunState::Reported);
                self.transition(RunState::Done);
                Ok(())
            }
            Err(e) => {
                self.journal.record("EXECUTE", Outcome::Failure);
                error!("Backup of {} failed: {}", self.source.description, e);
                self.discard_archive();
                self.error = Some(e.to_string());
                self.send_report(targets, Vec::new()).await;
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        targets: &mut [Box<dyn Target>],
        options: &BackupOptions,
    ) -> Result<(), BackupError> {
        if options.database || options.filesystem {
            self.transition(RunState::ArchiveBuilding);
            self.build_archive(options).await?;
            self.transition(RunState::ArchiveClosed);

            if let Some(archive) = &self.parts.archive {
                for target in targets.iter_mut() {
                    status(
                        self.quiet,
                        &format!("Transferring archive to {}", target.description()),
                    );
                    target.transfer_archive(archive, options.dry_run).await?;
                }
            }
            self.transition(RunState::Transferred);
        }

        if let Some(strategy) = &options.thinning {
            let reference = options.reference_time.unwrap_or_else(utils::now);
            let decide = |archives: Vec<ArchiveId>| strategy.apply(archives, reference);

            for target in targets.iter_mut() {
                status(
                    self.quiet,
                    &format!(
                        "Thinning archives on {} using strategy '{}'",
                        target.description(),
                        strategy
                    ),
                );
                target
                    .perform_thinning(&self.source.slug, &decide, options.dry_run)
                    .await?;
            }
            self.transition(RunState::Thinned);
        }

        if let Some(archive) = self.parts.archive.as_mut() {
            match &options.attic {
                Some(attic) => {
                    archive.rename(attic)?;
                }
                None => {
                    archive.remove()?;
                }
            }
        }
        self.transition(RunState::Cleaned);
        Ok(())
    }

    async fn build_archive(&mut self, options: &BackupOptions) -> Result<(), BackupError> {
        let Self {
            source,
            client,
            parts,
            quiet,
            ..
        } = self;

        let archive = parts
            .archive
            .insert(Archive::new(&source.slug).in_directory(&options.work_dir));
        archive.open()?;
        status(*quiet, &format!("Creating archive for {}", source.description));

        if options.database {
            status(*quiet, &format!("Processing database of {}", source.description));
            let database = parts
                .database
                .insert(Database::new(source.db_params()?, Arc::clone(client)));
            database.dump_to_archive(archive).await?;
        }

        if options.filesystem {
            status(*quiet, &format!("Processing filesystem of {}", source.description));
            let filesystem = parts.filesystem.insert(Filesystem::new(&source.path)?);
            filesystem.add_to_archive(archive)?;
        }

        let timestamp = archive.id().timestamp().to_string();
        archive.add_manifest(&timestamp)?;
        archive.close()?;
        Ok(())
    }

    /// Remove the local archive after a failure
    fn discard_archive(&mut self) {
        if let Some(archive) = self.parts.archive.as_mut() {
            if let Err(e) = archive.remove() {
                warn!("Failed to remove archive {}: {}", archive.filename(), e);
            }
        }
    }

    /// Calendar attachments listing the archives of the source on each target
    async fn calendars(&self, targets: &[Box<dyn Target>], today: NaiveDate) -> Vec<Attachment> {
        let mut attachments = Vec::new();
        for target in targets {
            match target.list_archives(Some(&self.source.slug)).await {
                Ok(archives) => {
                    let calendar = Calendar::new(archives.iter().map(|a| a.created().date()), today);
                    if let Some(document) = calendar.render() {
                        attachments.push(Attachment::html(
                            format!("{}-{}-calendar.html", self.source.slug, target.label()),
                            document,
                        ));
                    }
                }
                Err(e) => warn!("Cannot list archives on {}: {}", target.description(), e),
            }
        }
        attachments
    }

    /// Blocks of every component that took part in the run
    pub fn full_report(&self, targets: &[Box<dyn Target>]) -> String {
        let mut components: Vec<&dyn Reportable> = Vec::new();
        components.push(self);
        components.push(&self.source);
        if let Some(database) = &self.parts.database {
            components.push(database);
        }
        if let Some(filesystem) = &self.parts.filesystem {
            components.push(filesystem);
        }
        if let Some(archive) = &self.parts.archive {
            components.push(archive);
        }
        components.extend(targets.iter().map(|t| t.as_ref() as &dyn Reportable));
        render_report(components)
    }

    /// Mail subject marked with the outcome of the run
    pub fn subject(&self) -> String {
        let marker = if self.error.is_none() { "👍" } else { "❗" };
        format!("{marker}[BACKUP] Archive for {}", self.source.description)
    }

    async fn send_report(&self, targets: &[Box<dyn Target>], attachments: Vec<Attachment>) {
        let report = self.full_report(targets);

        if let Some(mailer) = self.mailer.as_ref().filter(|m| m.is_serviceable()) {
            status(self.quiet, &format!("Sending report to {mailer}"));
            let message = Message {
                subject: self.subject(),
                body: report.clone(),
                attachments,
                priority: if self.error.is_none() {
                    Priority::Normal
                } else {
                    Priority::High
                },
            };
            if let Err(e) = mailer.send(&message).await {
                warn!("Failed to send report: {}", e);
                if !self.quiet {
                    output::warning(&format!("Failed to send report: {e}"));
                }
            }
        }

        if !self.quiet {
            output::report(&report);
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state {:?} -> {:?}", self.state, next);
        if next == RunState::Done {
            info!(
                "Backup of {} finished in {}",
                self.source.description,
                format_duration(self.elapsed)
            );
        }
        self.state = next;
    }
}

impl Reportable for Backup {
    fn summary(&self) -> String {
        let mailer = self
            .mailer
            .as_ref()
            .map_or_else(|| "None".to_string(), |m| m.to_string());
        format_kv(
            Some("SITEBACKUP"),
            &[
                ("Execution Time", format_duration(self.elapsed)),
                (
                    "Execution Error",
                    self.error.clone().unwrap_or_else(|| "None".to_string()),
                ),
                ("Report(To)", mailer),
            ],
        )
    }

    fn journal(&self) -> &Journal {
        &self.journal
    }
}

fn status(quiet: bool, msg: &str) {
    if !quiet {
        output::status(msg);
    }
}
