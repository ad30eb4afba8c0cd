//! Filesystem backup collaborator

use crate::error::FilesystemError;
use sitebackup_archive::Archive;
use sitebackup_core::report::{Journal, Reportable};
use sitebackup_core::utils::format_kv;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Adds an installation directory tree to an archive
#[derive(Debug)]
pub struct Filesystem {
    path: PathBuf,
    journal: Journal,
}

impl Filesystem {
    /// Fails with [`FilesystemError::NotFound`] if `path` does not exist
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, FilesystemError> {
        let path = path.into();
        if !path.exists() {
            return Err(FilesystemError::NotFound { path });
        }
        Ok(Self {
            path,
            journal: Journal::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add the tree under the archive's name as top level directory
    pub fn add_to_archive(&mut self, archive: &mut Archive) -> Result<(), FilesystemError> {
        debug!(
            "add path '{}' to archive '{}'",
            self.path.display(),
            archive.name()
        );
        let name = archive.name();
        let result = archive
            .add_path(&self.path, &name)
            .map(|_| ())
            .map_err(FilesystemError::from);
        self.journal.check("ADD TO ARCHIVE", result)
    }
}

impl Reportable for Filesystem {
    fn summary(&self) -> String {
        format_kv(
            Some("FILESYSTEM"),
            &[("FS", self.path.display().to_string())],
        )
    }

    fn journal(&self) -> &Journal {
        &self.journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitebackup_core::report::Outcome;

    #[test]
    fn test_missing_path() {
        let temp = tempfile::tempdir().unwrap();
        let err = Filesystem::new(temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, FilesystemError::NotFound { .. }));
    }

    #[test]
    fn test_add_requires_open_archive() {
        let temp = tempfile::tempdir().unwrap();
        let mut fs = Filesystem::new(temp.path()).unwrap();
        let mut archive = Archive::new("site").in_directory(temp.path());

        assert!(fs.add_to_archive(&mut archive).is_err());
        assert_eq!(
            fs.journal().outcomes("ADD TO ARCHIVE").next(),
            Some(&Outcome::Failure)
        );
    }

    #[test]
    fn test_summary() {
        let temp = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(temp.path()).unwrap();
        assert_eq!(
            fs.summary(),
            format!("FILESYSTEM\n    FS: {}", temp.path().display())
        );
    }
}
