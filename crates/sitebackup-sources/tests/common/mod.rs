//! Common test utilities for sitebackup-sources
//!
//! - [`FakeSqlClient`] answers queries from canned rows without a server
//! - fixture writers lay out minimal application installations

#![allow(dead_code)]

use async_trait::async_trait;
use sitebackup_sources::{DatabaseError, DbParams, SqlClient};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// In-memory [`SqlClient`]
///
/// A query is answered by the first canned row whose needle it contains.
#[derive(Default)]
pub struct FakeSqlClient {
    rows: Vec<(String, String)>,
    tables: Vec<String>,
    dump: Vec<u8>,
    deny_access: bool,
    queries: Mutex<Vec<String>>,
    connections: Mutex<Vec<DbParams>>,
}

impl FakeSqlClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(mut self, needle: &str, value: &str) -> Self {
        self.rows.push((needle.to_string(), value.to_string()));
        self
    }

    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_dump(mut self, dump: &[u8]) -> Self {
        self.dump = dump.to_vec();
        self
    }

    /// Reject every call like a server refusing the credentials
    pub fn denying_access(mut self) -> Self {
        self.deny_access = true;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn connections(&self) -> Vec<DbParams> {
        self.connections.lock().unwrap().clone()
    }

    fn connect(&self, params: &DbParams) -> Result<(), DatabaseError> {
        self.connections.lock().unwrap().push(params.clone());
        if self.deny_access {
            return Err(DatabaseError::AccessDenied {
                message: format!(
                    "ERROR 1045 (28000): Access denied for user '{}'@'{}'",
                    params.user, params.host
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SqlClient for FakeSqlClient {
    async fn query_scalar(
        &self,
        params: &DbParams,
        query: &str,
    ) -> Result<Option<String>, DatabaseError> {
        self.connect(params)?;
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .rows
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, value)| value.clone()))
    }

    async fn list_tables(&self, params: &DbParams) -> Result<Vec<String>, DatabaseError> {
        self.connect(params)?;
        let prefix = params.prefix.clone().unwrap_or_default();
        Ok(self
            .tables
            .iter()
            .filter(|t| t.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn dump(&self, params: &DbParams, _tables: &[String]) -> Result<Vec<u8>, DatabaseError> {
        self.connect(params)?;
        Ok(self.dump.clone())
    }
}

/// FakeSqlClient answering the WordPress identification queries
pub fn wordpress_client(title: &str, email: &str) -> FakeSqlClient {
    FakeSqlClient::new()
        .with_row("'blogname'", title)
        .with_row("'admin_email'", email)
}

pub fn write_wordpress(root: &Path) {
    fs::write(
        root.join("wp-config.php"),
        r#"<?php
define('DB_NAME', 'wordpress');
define('DB_USER', 'wpuser');
define('DB_PASSWORD', 'wppass');
define('DB_HOST', 'localhost');
$table_prefix = 'wp_';
"#,
    )
    .unwrap();
}

pub fn write_humhub(root: &Path) {
    let dir = root.join("protected/config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("dynamic.php"),
        r#"<?php return array (
  'components' => array (
    'db' => array (
      'dsn' => 'mysql:host=localhost;dbname=humhub',
      'username' => 'hhuser',
      'password' => 'hhpass',
    ),
  ),
  'name' => 'Config Name',
);
"#,
    )
    .unwrap();
}

pub fn write_vaultwarden(root: &Path) {
    fs::write(
        root.join("config.json"),
        r#"{"domain": "https://vault.example.org", "smtp_from": "vault@example.org"}"#,
    )
    .unwrap();
}
