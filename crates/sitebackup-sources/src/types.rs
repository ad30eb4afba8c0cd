//! Source model shared by all application variants

use crate::error::{DatabaseError, ProbeFailure};
use sitebackup_core::report::{Journal, Reportable};
use sitebackup_core::utils::{format_kv, slugify};
use std::fmt;
use std::path::{Path, PathBuf};

/// Port used when the configuration names none
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Connection character set used when the configuration names none
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Supported application kinds, in probe order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    WordPress,
    HumHub,
    Vaultwarden,
}

impl SourceKind {
    /// All kinds in the order they are probed
    pub const ALL: [SourceKind; 3] = [
        SourceKind::WordPress,
        SourceKind::HumHub,
        SourceKind::Vaultwarden,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::WordPress => "WordPress",
            SourceKind::HumHub => "HumHub",
            SourceKind::Vaultwarden => "Vaultwarden",
        }
    }

    /// Human description of an instance with the given title
    pub fn describe(&self, title: &str) -> String {
        match self {
            SourceKind::WordPress => format!("WordPress Blog '{title}'"),
            SourceKind::HumHub => format!("HumHub '{title}'"),
            SourceKind::Vaultwarden => format!("Vaultwarden '{title}'"),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Explicit database parameters overriding the parsed configuration
///
/// Only values that are set replace parsed ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    pub dbname: Option<String>,
    pub dbhost: Option<String>,
    pub dbport: Option<u16>,
    pub dbuser: Option<String>,
    pub dbpass: Option<String>,
    pub dbprefix: Option<String>,
}

/// Complete connection parameters for database access
#[derive(Clone, PartialEq, Eq)]
pub struct DbParams {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub prefix: Option<String>,
    pub charset: String,
}

impl fmt::Debug for DbParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbParams")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("charset", &self.charset)
            .finish()
    }
}

/// An application instance on disk with its identity and database parameters
#[derive(Debug, Clone)]
pub struct Source {
    pub kind: SourceKind,

    /// Installation directory
    pub path: PathBuf,

    /// Configuration file the parameters were read from
    pub config_file: PathBuf,

    pub title: String,

    /// URL-safe form of the title, used as archive label
    pub slug: String,

    pub description: String,

    /// Contact address of the instance
    pub email: String,

    pub db_name: Option<String>,
    pub db_host: Option<String>,
    pub db_port: u16,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_prefix: Option<String>,
    pub db_charset: String,

    journal: Journal,
}

impl Source {
    pub(crate) fn new(kind: SourceKind, path: &Path, config_file: PathBuf) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            config_file,
            title: String::new(),
            slug: String::new(),
            description: String::new(),
            email: String::new(),
            db_name: None,
            db_host: None,
            db_port: DEFAULT_DB_PORT,
            db_user: None,
            db_password: None,
            db_prefix: None,
            db_charset: DEFAULT_CHARSET.to_string(),
            journal: Journal::new(),
        }
    }

    /// Sets the title together with the derived slug and description
    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.slug = slugify(&self.title);
        self.description = self.kind.describe(&self.title);
    }

    pub(crate) fn apply_overrides(&mut self, overrides: &SourceConfig) {
        if let Some(name) = &overrides.dbname {
            self.db_name = Some(name.clone());
        }
        if let Some(host) = &overrides.dbhost {
            self.db_host = Some(host.clone());
        }
        if let Some(port) = overrides.dbport {
            self.db_port = port;
        }
        if let Some(user) = &overrides.dbuser {
            self.db_user = Some(user.clone());
        }
        if let Some(password) = &overrides.dbpass {
            self.db_password = Some(password.clone());
        }
        if let Some(prefix) = &overrides.dbprefix {
            self.db_prefix = Some(prefix.clone());
        }
    }

    /// True if the instance uses a database
    pub fn has_database(&self) -> bool {
        self.db_name.is_some()
    }

    /// Connection parameters; fails if name, host, user or password is missing
    pub fn db_params(&self) -> Result<DbParams, DatabaseError> {
        fn required(
            value: &Option<String>,
            parameter: &'static str,
        ) -> Result<String, DatabaseError> {
            value
                .clone()
                .ok_or(DatabaseError::NotConfigured { parameter })
        }

        Ok(DbParams {
            name: required(&self.db_name, "name")?,
            host: required(&self.db_host, "host")?,
            port: self.db_port,
            user: required(&self.db_user, "user")?,
            password: required(&self.db_password, "password")?,
            prefix: self.db_prefix.clone(),
            charset: self.db_charset.clone(),
        })
    }

    /// Connection parameters needed while probing the database
    pub(crate) fn probe_params(&self) -> Result<DbParams, ProbeFailure> {
        self.db_params().map_err(|e| match e {
            DatabaseError::NotConfigured { parameter } => ProbeFailure::MissingParameter { parameter },
            other => ProbeFailure::Database(other),
        })
    }

    pub(crate) fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }
}

impl Reportable for Source {
    fn summary(&self) -> String {
        let title = self.kind.name().to_uppercase();
        let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        format_kv(
            Some(&title),
            &[
                ("Slug", self.slug.clone()),
                ("Title", self.title.clone()),
                ("Email", self.email.clone()),
                ("Path", self.path.display().to_string()),
                ("DB(Name)", or_dash(&self.db_name)),
                ("DB(Host)", or_dash(&self.db_host)),
                ("DB(Port)", self.db_port.to_string()),
                ("DB(Prefix)", or_dash(&self.db_prefix)),
                ("DB(User)", or_dash(&self.db_user)),
                (
                    "DB(Pass)",
                    if self.db_password.is_some() {
                        "*******".to_string()
                    } else {
                        "-".to_string()
                    },
                ),
            ],
        )
    }

    fn journal(&self) -> &Journal {
        &self.journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Source {
        let mut source = Source::new(
            SourceKind::WordPress,
            Path::new("/var/www/blog"),
            PathBuf::from("/var/www/blog/wp-config.php"),
        );
        source.db_name = Some("wp".into());
        source.db_host = Some("localhost".into());
        source.db_user = Some("wpuser".into());
        source.db_password = Some("secret".into());
        source.db_prefix = Some("wp_".into());
        source
    }

    #[test]
    fn test_set_title_derives_slug_and_description() {
        let mut source = source();
        source.set_title("My Tiny Blog!");
        assert_eq!(source.slug, "my-tiny-blog");
        assert_eq!(source.description, "WordPress Blog 'My Tiny Blog!'");
    }

    #[test]
    fn test_overrides_replace_only_set_values() {
        let mut source = source();
        source.apply_overrides(&SourceConfig {
            dbhost: Some("db.internal".into()),
            dbport: Some(3307),
            ..Default::default()
        });

        assert_eq!(source.db_host.as_deref(), Some("db.internal"));
        assert_eq!(source.db_port, 3307);
        assert_eq!(source.db_name.as_deref(), Some("wp"));
        assert_eq!(source.db_user.as_deref(), Some("wpuser"));
    }

    #[test]
    fn test_db_params_requires_credentials() {
        let mut source = source();
        assert_eq!(source.db_params().unwrap().charset, DEFAULT_CHARSET);

        source.db_password = None;
        assert!(matches!(
            source.db_params(),
            Err(DatabaseError::NotConfigured {
                parameter: "password"
            })
        ));
    }

    #[test]
    fn test_db_params_debug_hides_password() {
        let params = source().db_params().unwrap();
        let debug = format!("{params:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_summary_masks_password() {
        let mut source = source();
        source.set_title("Blog");
        let summary = source.summary();
        assert!(summary.starts_with("WORDPRESS\n    Slug: blog"));
        assert!(summary.contains("DB(Pass): *******"));
        assert!(!summary.contains("secret"));
    }
}
