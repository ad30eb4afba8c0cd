//! Database access and the database backup collaborator

use crate::error::DatabaseError;
use crate::types::DbParams;
use async_trait::async_trait;
use sitebackup_archive::Archive;
use sitebackup_core::report::{Journal, Reportable};
use sitebackup_core::utils::{format_bytes, format_kv};
use std::fmt;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// SQL access used to identify sources and dump their tables
#[async_trait]
pub trait SqlClient: Send + Sync {
    /// First column of the first row, `None` if the query returned no row
    async fn query_scalar(
        &self,
        params: &DbParams,
        query: &str,
    ) -> Result<Option<String>, DatabaseError>;

    /// Tables of the database, restricted to `params.prefix` when set
    async fn list_tables(&self, params: &DbParams) -> Result<Vec<String>, DatabaseError>;

    /// SQL dump of the given tables
    async fn dump(&self, params: &DbParams, tables: &[String]) -> Result<Vec<u8>, DatabaseError>;
}

/// [`SqlClient`] driving the `mysql` and `mysqldump` command line tools
///
/// The password is handed over through `MYSQL_PWD` so it never shows up in
/// the process list.
#[derive(Debug, Clone)]
pub struct MysqlClient {
    mysql: String,
    mysqldump: String,
}

impl Default for MysqlClient {
    fn default() -> Self {
        Self {
            mysql: "mysql".to_string(),
            mysqldump: "mysqldump".to_string(),
        }
    }
}

impl MysqlClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use other executables, e.g. `mariadb` and `mariadb-dump`
    pub fn with_programs(mysql: impl Into<String>, mysqldump: impl Into<String>) -> Self {
        Self {
            mysql: mysql.into(),
            mysqldump: mysqldump.into(),
        }
    }

    fn command(program: &str, params: &DbParams) -> Command {
        let mut command = Command::new(program);
        command
            .arg(format!("--host={}", params.host))
            .arg(format!("--port={}", params.port))
            .arg(format!("--user={}", params.user))
            .arg(format!("--default-character-set={}", params.charset))
            .env("MYSQL_PWD", &params.password);
        command
    }

    async fn run(
        &self,
        program: &str,
        mut command: Command,
    ) -> Result<Vec<u8>, DatabaseError> {
        let output = command
            .output()
            .await
            .map_err(|source| DatabaseError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("{program} exited with {}", output.status),
                text => text.to_string(),
            };
            if message.starts_with("ERROR 1045") {
                return Err(DatabaseError::AccessDenied { message });
            }
            return Err(DatabaseError::Query { message });
        }

        Ok(output.stdout)
    }

    async fn execute(&self, params: &DbParams, query: &str) -> Result<Vec<String>, DatabaseError> {
        debug!("mysql {}: {}", params.name, query);
        let mut command = Self::command(&self.mysql, params);
        command
            .arg("--batch")
            .arg("--skip-column-names")
            .arg(format!("--execute={query}"))
            .arg(&params.name);

        let stdout = self.run(&self.mysql, command).await?;
        Ok(String::from_utf8_lossy(&stdout)
            .lines()
            .map(unescape_batch)
            .collect())
    }
}

#[async_trait]
impl SqlClient for MysqlClient {
    async fn query_scalar(
        &self,
        params: &DbParams,
        query: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let rows = self.execute(params, query).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.split('\t').next().unwrap_or_default().to_string()))
    }

    async fn list_tables(&self, params: &DbParams) -> Result<Vec<String>, DatabaseError> {
        let query = show_tables_query(params.prefix.as_deref());
        let rows = self.execute(params, &query).await?;
        Ok(rows
            .into_iter()
            .filter(|row| !row.trim().is_empty())
            .collect())
    }

    async fn dump(&self, params: &DbParams, tables: &[String]) -> Result<Vec<u8>, DatabaseError> {
        debug!("mysqldump {} ({} tables)", params.name, tables.len());
        let mut command = Self::command(&self.mysqldump, params);
        command.arg("--opt").arg(&params.name).args(tables);
        self.run(&self.mysqldump, command).await
    }
}

/// `SHOW TABLES` statement, matching the prefix literally when given
pub fn show_tables_query(prefix: Option<&str>) -> String {
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => {
            let mut pattern = String::with_capacity(prefix.len() + 4);
            for c in prefix.chars() {
                match c {
                    '\\' => pattern.push_str("\\\\\\\\"),
                    '\'' => pattern.push_str("\\'"),
                    '%' | '_' => {
                        pattern.push('\\');
                        pattern.push(c);
                    }
                    c => pattern.push(c),
                }
            }
            format!("SHOW TABLES LIKE '{pattern}%'")
        }
        None => "SHOW TABLES".to_string(),
    }
}

/// Undo the escaping `mysql --batch` applies to field values
fn unescape_batch(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Outcome of a database dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbResult {
    pub size: u64,
    pub tables: usize,
}

impl fmt::Display for DbResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Result(size={}, numberOfTables={})",
            format_bytes(self.size),
            self.tables
        )
    }
}

/// Dumps the tables of one database into an archive
pub struct Database {
    params: DbParams,
    client: Arc<dyn SqlClient>,
    journal: Journal,
}

impl Database {
    pub fn new(params: DbParams, client: Arc<dyn SqlClient>) -> Self {
        Self {
            params,
            client,
            journal: Journal::new(),
        }
    }

    pub fn params(&self) -> &DbParams {
        &self.params
    }

    /// Store the dump as `{archive-name}-db.sql`
    pub async fn dump_to_archive(&mut self, archive: &mut Archive) -> Result<DbResult, DatabaseError> {
        let result = self.dump(archive).await;
        self.journal.observe("DUMP TO ARCHIVE", result)
    }

    async fn dump(&self, archive: &mut Archive) -> Result<DbResult, DatabaseError> {
        let tables = self.client.list_tables(&self.params).await?;
        if tables.is_empty() {
            return Err(DatabaseError::NoTables {
                database: self.params.name.clone(),
            });
        }
        info!("Dumping {} tables of database {}", tables.len(), self.params.name);

        let dump = self.client.dump(&self.params, &tables).await?;

        let mut entry = archive.create_entry(&format!("{}-db.sql", archive.name()), true);
        entry.write(&dump)?;
        let size = entry.size();
        archive.add_entry(entry)?;

        Ok(DbResult {
            size,
            tables: tables.len(),
        })
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Reportable for Database {
    fn summary(&self) -> String {
        format_kv(Some("DATABASE"), &[("DB", self.params.name.as_str())])
    }

    fn journal(&self) -> &Journal {
        &self.journal
    }
}
