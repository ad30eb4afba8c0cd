//! Configuration types for sitebackup.yaml

use crate::error::Result;
use crate::thinning::ThinningStrategy;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Default S3 region used when none is configured
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Root sitebackup.yaml configuration
///
/// Every field is optional; values given on the command line take
/// precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteBackupConfig {
    /// S3-compatible upload target
    pub s3: S3Settings,

    /// Report delivery
    pub mail: MailSettings,

    /// Thinning strategy code (e.g. `L10` or `7D4W12M`)
    pub thinning: Option<String>,

    /// Directory receiving the local archive after the run
    pub attic: Option<Utf8PathBuf>,
}

/// S3 target settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3Settings {
    /// Endpoint host, optionally with `:port`
    pub host: Option<String>,

    /// Endpoint port
    pub port: Option<u16>,

    pub access_key: Option<String>,

    pub secret_key: Option<String>,

    /// Bucket name; defaults to the source slug
    pub bucket: Option<String>,

    pub region: String,

    /// Use HTTPS
    pub secure: bool,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            access_key: None,
            secret_key: None,
            bucket: None,
            region: DEFAULT_S3_REGION.to_string(),
            secure: true,
        }
    }
}

/// Mail report settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailSettings {
    /// Sender address
    pub from: Option<String>,

    /// Recipient addresses
    pub to: Vec<String>,

    /// Also send the report to the contact address of the source
    pub to_admin: bool,
}

impl SiteBackupConfig {
    /// Parse the configured thinning strategy, if any
    pub fn thinning_strategy(&self) -> Result<Option<ThinningStrategy>> {
        self.thinning.as_deref().map(str::parse).transpose()
    }
}
