//! # sitebackup
//!
//! Backs up a web application instance (database dump and installation
//! directory) into a timestamped archive, uploads it to S3-compatible
//! storage, thins out old archives and reports the run by mail.
//!
//! The binary is a thin wrapper around [`app::run`]; the orchestration lives
//! in [`backup::Backup`].

pub mod app;
pub mod backup;
pub mod calendar;
pub mod cli;
pub mod mail;
pub mod output;

pub use backup::{Backup, BackupError, BackupOptions, RunState};
pub use mail::{Attachment, MailError, MailTransport, Mailer, Message, Priority, Sendmail};
