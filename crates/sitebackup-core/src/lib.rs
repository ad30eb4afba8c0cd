//! # sitebackup-core
//!
//! Core library for sitebackup providing:
//! - The retention ("thinning") engine deciding which archives to keep
//! - Strategy parsing for the `L<n>` and `<d>D<w>W<m>M` codes
//! - An explicit outcome journal used to build run reports
//! - Configuration file loading (sitebackup.yaml)
//! - Shared helpers for timestamps, slugs and human readable values

pub mod config;
pub mod error;
pub mod report;
pub mod thinning;
pub mod utils;

pub use config::SiteBackupConfig;
pub use error::{Error, Result};
pub use report::{Journal, Outcome, Reportable};
pub use thinning::{Decision, ThinningStrategy, Timestamped};
