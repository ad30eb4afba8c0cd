//! Configuration loading and management

mod loader;
mod types;

pub use loader::CONFIG_FILE_NAMES;
pub use types::{MailSettings, S3Settings, SiteBackupConfig, DEFAULT_S3_REGION};
