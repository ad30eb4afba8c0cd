//! Archive container lifecycle.
//!
//! An [`Archive`] is created closed, opened once to receive entries and
//! closed once to finish the gzip stream. After closing, the file can be
//! moved to a permanent directory or removed.

use crate::compression::{calculate_checksum, DEFAULT_COMPRESSION_LEVEL};
use crate::entry::ArchiveEntry;
use crate::error::{ArchiveError, Result};
use crate::id::ArchiveId;
use crate::manifest::manifest_entry;
use chrono::NaiveDateTime;
use flate2::write::GzEncoder;
use flate2::Compression;
use sitebackup_core::report::{Journal, Outcome, Reportable};
use sitebackup_core::utils::{self, format_bytes, format_kv};
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tar::{Builder as TarBuilder, EntryType, Header};
use tracing::{debug, info};

/// Result of closing an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveResult {
    /// Size of the archive file in bytes
    pub size: u64,

    /// SHA256 checksum of the archive file
    pub checksum: String,
}

impl fmt::Display for ArchiveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Result(size={})", format_bytes(self.size))
    }
}

enum State {
    Created,
    Open(TarBuilder<GzEncoder<File>>),
    Closed,
}

/// Timestamped tar+gzip container written to a local directory.
pub struct Archive {
    id: ArchiveId,
    directory: PathBuf,
    compression_level: u32,
    state: State,
    result: Option<ArchiveResult>,
    journal: Journal,
}

impl Archive {
    /// Creates an archive for `label` stamped with the current time.
    pub fn new(label: &str) -> Self {
        Self::with_id(ArchiveId::new(label, utils::now()))
    }

    /// Creates an archive for `label` stamped with `created`.
    pub fn with_timestamp(label: &str, created: NaiveDateTime) -> Self {
        Self::with_id(ArchiveId::new(label, created))
    }

    fn with_id(id: ArchiveId) -> Self {
        Self {
            id,
            directory: PathBuf::from("."),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            state: State::Created,
            result: None,
            journal: Journal::new(),
        }
    }

    /// Sets the directory the archive file is written to.
    pub fn in_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Sets the gzip compression level (1-9).
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.clamp(1, 9);
        self
    }

    pub fn id(&self) -> &ArchiveId {
        &self.id
    }

    /// `{label}-{timestamp}`
    pub fn name(&self) -> String {
        self.id.name()
    }

    /// `{label}-{timestamp}.tgz`
    pub fn filename(&self) -> String {
        self.id.filename()
    }

    /// Directory currently holding the archive file.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path of the archive file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(self.filename())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Size and checksum, available once the archive was closed.
    pub fn result(&self) -> Option<&ArchiveResult> {
        self.result.as_ref()
    }

    /// Creates the archive file and starts the compressed stream.
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            State::Created => {}
            State::Open(_) => return Err(ArchiveError::AlreadyOpen { name: self.name() }),
            State::Closed => return Err(ArchiveError::Closed { name: self.name() }),
        }

        let path = self.path();
        debug!("Opening archive {}", path.display());
        let file = File::create(&path)?;
        let encoder = GzEncoder::new(file, Compression::new(self.compression_level));
        let mut builder = TarBuilder::new(encoder);
        builder.follow_symlinks(false);

        self.state = State::Open(builder);
        Ok(())
    }

    /// Finishes the compressed stream and records size and checksum.
    pub fn close(&mut self) -> Result<ArchiveResult> {
        let builder = match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(builder) => builder,
            State::Created => {
                self.state = State::Created;
                return Err(ArchiveError::NotOpen { name: self.name() });
            }
            State::Closed => return Err(ArchiveError::Closed { name: self.name() }),
        };

        let result = Self::finish(builder, &self.path());
        let result = self.journal.observe("CREATE ARCHIVE", result)?;

        info!(
            "Closed archive {} ({})",
            self.filename(),
            format_bytes(result.size)
        );
        self.result = Some(result.clone());
        Ok(result)
    }

    fn finish(builder: TarBuilder<GzEncoder<File>>, path: &Path) -> Result<ArchiveResult> {
        let encoder = builder.into_inner()?;
        let file = encoder.finish()?;
        file.sync_all()?;
        drop(file);

        let size = fs::metadata(path)?.len();
        let checksum = calculate_checksum(path)?;
        Ok(ArchiveResult { size, checksum })
    }

    /// Creates an empty in-memory entry; commit it with [`Archive::add_entry`].
    pub fn create_entry(&self, name: &str, binary: bool) -> ArchiveEntry {
        ArchiveEntry::new(name, binary)
    }

    /// Commits an entry under its name, stamped with its creation time.
    pub fn add_entry(&mut self, entry: ArchiveEntry) -> Result<String> {
        let result = self.append_entry(&entry);
        self.journal.observe("ADD ENTRY", result)
    }

    fn append_entry(&mut self, entry: &ArchiveEntry) -> Result<String> {
        let name = self.name();
        let builder = self.builder_mut()?;

        let mtime = entry
            .created()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(entry.size());
        header.set_mode(0o644);
        header.set_mtime(mtime);

        debug!(
            "Adding {} entry {} ({} bytes) to archive {}",
            if entry.is_binary() { "binary" } else { "text" },
            entry.name(),
            entry.size(),
            name
        );
        builder.append_data(&mut header, entry.name(), entry.contents())?;
        Ok(entry.name().to_string())
    }

    /// Commits a file or directory tree under an archive relative name.
    pub fn add_path(&mut self, path: &Path, name: &str) -> Result<PathBuf> {
        let result = self.append_path(path, name);
        let outcome = match &result {
            Ok(p) => Outcome::Success(p.display().to_string()),
            Err(_) => Outcome::Failure,
        };
        self.journal.record("ADD PATH", outcome);
        result
    }

    fn append_path(&mut self, path: &Path, name: &str) -> Result<PathBuf> {
        let builder = self.builder_mut()?;

        if !path.exists() {
            return Err(ArchiveError::PathNotFound {
                path: path.to_path_buf(),
            });
        }

        debug!("Adding path {} as {}", path.display(), name);
        if path.is_dir() {
            builder.append_dir_all(name, path)?;
        } else {
            builder.append_path_with_name(path, name)?;
        }
        Ok(path.to_path_buf())
    }

    /// Commits the `MANIFEST` entry for `timestamp`.
    pub fn add_manifest(&mut self, timestamp: &str) -> Result<()> {
        let result = manifest_entry(timestamp)
            .map_err(ArchiveError::from)
            .and_then(|entry| self.append_entry(&entry))
            .map(|_| ());
        self.journal.check("ADD MANIFEST", result)
    }

    /// Moves the archive file into `destination`; no-op if it is already there.
    pub fn rename(&mut self, destination: &Path) -> Result<PathBuf> {
        let result = self.move_to(destination);
        let outcome = match &result {
            Ok(p) => Outcome::Success(p.display().to_string()),
            Err(_) => Outcome::Failure,
        };
        self.journal.record("RENAME", outcome);
        result
    }

    fn move_to(&mut self, destination: &Path) -> Result<PathBuf> {
        if self.is_open() {
            return Err(ArchiveError::AlreadyOpen { name: self.name() });
        }

        let source = self.path();
        if same_directory(&self.directory, destination) {
            return Ok(source);
        }

        let target = destination.join(self.filename());
        match fs::rename(&source, &target) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                fs::copy(&source, &target)?;
                fs::remove_file(&source)?;
            }
            Err(e) => return Err(e.into()),
        }

        info!("Moved archive to {}", target.display());
        self.directory = destination.to_path_buf();
        Ok(target)
    }

    /// Deletes the archive file; no-op if it does not exist.
    ///
    /// An archive still open is abandoned without finishing the stream.
    pub fn remove(&mut self) -> Result<PathBuf> {
        if self.is_open() {
            self.state = State::Closed;
        }

        let path = self.path();
        let result = if path.is_file() {
            debug!("Removing archive {}", path.display());
            fs::remove_file(&path).map(|_| path.clone())
        } else {
            Ok(path.clone())
        };

        let result = result.map_err(ArchiveError::from);
        let outcome = match &result {
            Ok(p) => Outcome::Success(p.display().to_string()),
            Err(_) => Outcome::Failure,
        };
        self.journal.record("REMOVE", outcome);
        result
    }

    fn builder_mut(&mut self) -> Result<&mut TarBuilder<GzEncoder<File>>> {
        match &mut self.state {
            State::Open(builder) => Ok(builder),
            State::Created => Err(ArchiveError::NotOpen { name: self.id.name() }),
            State::Closed => Err(ArchiveError::Closed { name: self.id.name() }),
        }
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

impl Reportable for Archive {
    fn summary(&self) -> String {
        format_kv(Some("ARCHIVE"), &[("Name", self.name())])
    }

    fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Created => "created",
            State::Open(_) => "open",
            State::Closed => "closed",
        };
        f.debug_struct("Archive")
            .field("id", &self.id)
            .field("directory", &self.directory)
            .field("state", &state)
            .field("result", &self.result)
            .finish()
    }
}
