//! HumHub instances, identified by `protected/config/dynamic.php`

use crate::database::SqlClient;
use crate::error::{ProbeError, ProbeFailure};
use crate::factory::{locate_config, query_required, read_config};
use crate::php::{self, PhpValue};
use crate::types::{Source, SourceConfig, SourceKind};
use std::path::Path;
use tracing::debug;

const CONFIG_FILE: &str = "protected/config/dynamic.php";

/// Probe `path` for a HumHub installation
pub async fn probe(
    path: &Path,
    overrides: &SourceConfig,
    client: &dyn SqlClient,
) -> Result<Source, ProbeError> {
    identify(path, overrides, client)
        .await
        .map_err(|reason| ProbeError::new(SourceKind::HumHub, reason))
}

async fn identify(
    path: &Path,
    overrides: &SourceConfig,
    client: &dyn SqlClient,
) -> Result<Source, ProbeFailure> {
    let config = locate_config(path, CONFIG_FILE)?;
    let text = read_config(&config)?;

    let mut source = Source::new(SourceKind::HumHub, path, config.clone());
    parse_configuration(&mut source, &text).map_err(|message| ProbeFailure::InvalidConfig {
        config,
        message,
    })?;
    source.journal_mut().record_parameter("PARSE CONFIGURATION", "file", CONFIG_FILE);
    source.apply_overrides(overrides);

    let params = source.probe_params()?;
    let table = format!("{}setting", params.prefix.as_deref().unwrap_or_default());

    let title = query_required(
        client,
        &params,
        &format!("SELECT value FROM {table} WHERE name = 'name'"),
    )
    .await?;
    let email = query_required(
        client,
        &params,
        &format!("SELECT value FROM {table} WHERE name = 'mailer.systemEmailAddress'"),
    )
    .await?;
    debug!("HumHub title={title} email={email}");

    source.set_title(title);
    source.email = email;
    Ok(source)
}

/// Extract the title and database parameters from the returned array
pub(crate) fn parse_configuration(source: &mut Source, text: &str) -> Result<(), String> {
    let config = php::parse_return(text).map_err(|e| e.to_string())?;

    let title = config
        .get("name")
        .and_then(PhpValue::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "no title given".to_string())?;
    source.set_title(title);

    let db = config.get_path("components.db");
    let dsn = db
        .and_then(|db| db.get("dsn"))
        .and_then(PhpValue::as_str)
        .and_then(parse_dsn)
        .ok_or_else(|| "no database given".to_string())?;

    source.db_host = Some(dsn.host);
    source.db_name = Some(dsn.dbname);
    if let Some(port) = dsn.port {
        source.db_port = port;
    }

    let string = |key: &str| {
        db.and_then(|db| db.get(key))
            .and_then(PhpValue::as_str)
            .map(str::to_string)
    };
    source.db_user = string("username");
    source.db_password = string("password");
    source.db_prefix = string("tablePrefix").filter(|p| !p.is_empty());
    if let Some(charset) = string("charset") {
        source.db_charset = charset;
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct Dsn {
    host: String,
    port: Option<u16>,
    dbname: String,
}

/// `mysql:host=<host>;[port=<port>;]dbname=<name>`
fn parse_dsn(dsn: &str) -> Option<Dsn> {
    let rest = dsn.strip_prefix("mysql:")?;
    let mut host = None;
    let mut port = None;
    let mut dbname = None;
    for part in rest.split(';') {
        match part.trim().split_once('=') {
            Some(("host", value)) => host = Some(value.to_string()),
            Some(("port", value)) => port = value.parse().ok(),
            Some(("dbname", value)) => dbname = Some(value.to_string()),
            _ => {}
        }
    }
    Some(Dsn {
        host: host.filter(|h| !h.is_empty())?,
        port,
        dbname: dbname.filter(|n| !n.is_empty())?,
    })
}
