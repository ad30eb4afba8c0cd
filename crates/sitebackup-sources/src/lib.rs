//! # sitebackup-sources
//!
//! Identifies the web application installed in a directory and provides the
//! collaborators that copy its data into an archive.
//!
//! - [`SourceFactory`] probes WordPress, HumHub and Vaultwarden in that order
//! - [`Database`] dumps the application tables through a [`SqlClient`]
//! - [`Filesystem`] adds the installation directory tree
//!
//! The default [`SqlClient`] is [`MysqlClient`], which drives the `mysql`
//! and `mysqldump` command line tools.

pub mod database;
pub mod error;
pub mod factory;
pub mod filesystem;
pub mod humhub;
pub mod php;
pub mod types;
pub mod vaultwarden;
pub mod wordpress;

pub use database::{Database, DbResult, MysqlClient, SqlClient};
pub use error::{DatabaseError, FilesystemError, ProbeError, ProbeFailure, SourceError};
pub use factory::SourceFactory;
pub use filesystem::Filesystem;
pub use types::{DbParams, Source, SourceConfig, SourceKind, DEFAULT_CHARSET, DEFAULT_DB_PORT};
