//! Configuration file loading and parsing

use super::types::SiteBackupConfig;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// Configuration file names searched in the working directory
pub const CONFIG_FILE_NAMES: &[&str] = &["sitebackup.yaml", "sitebackup.yml"];

impl SiteBackupConfig {
    /// Load configuration from the given path, or from the working directory
    ///
    /// An explicitly named file must exist. Without a path the working
    /// directory is searched for [`CONFIG_FILE_NAMES`]; when none is present
    /// the default configuration is returned.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let found = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                Some((p.to_owned(), content))
            }
            None => Self::find_config()?,
        };

        match found {
            Some((config_path, content)) => {
                debug!("Loading configuration from {}", config_path);
                Self::parse(&content)
            }
            None => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.thinning_strategy()
            .map_err(|e| Error::invalid_config(format!("thinning: {e}")))?;
        Ok(())
    }

    /// Find a configuration file in the current directory
    fn find_config() -> Result<Option<(Utf8PathBuf, String)>> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        for name in CONFIG_FILE_NAMES {
            let path = cwd.join(name);
            if path.is_file() {
                let content = fs::read_to_string(&path)?;
                return Ok(Some((path, content)));
            }
        }

        Ok(None)
    }
}
