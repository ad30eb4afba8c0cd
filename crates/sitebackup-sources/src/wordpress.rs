//! WordPress instances, identified by `wp-config.php`

use crate::database::SqlClient;
use crate::error::{ProbeError, ProbeFailure};
use crate::factory::{locate_config, query_required, read_config};
use crate::types::{Source, SourceConfig, SourceKind};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const CONFIG_FILE: &str = "wp-config.php";

/// `define('KEY', 'VALUE');`
static DEFINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*define\(\s*['"]([^'"]+)['"]\s*,\s*['"]([^'"]*)['"]\s*\)\s*;"#)
        .expect("define regex is valid")
});

/// `$table_prefix = 'PREFIX';`
static TABLE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\$table_prefix\s*=\s*['"]([^'"]+)['"]\s*;"#)
        .expect("table prefix regex is valid")
});

static HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<host>[^:]+):?(?P<port>[0-9]*)$").expect("host regex is valid")
});

/// Probe `path` for a WordPress installation
pub async fn probe(
    path: &Path,
    overrides: &SourceConfig,
    client: &dyn SqlClient,
) -> Result<Source, ProbeError> {
    identify(path, overrides, client)
        .await
        .map_err(|reason| ProbeError::new(SourceKind::WordPress, reason))
}

async fn identify(
    path: &Path,
    overrides: &SourceConfig,
    client: &dyn SqlClient,
) -> Result<Source, ProbeFailure> {
    let config = locate_config(path, CONFIG_FILE)?;
    let text = read_config(&config)?;

    let mut source = Source::new(SourceKind::WordPress, path, config);
    parse_configuration(&mut source, &text);
    source.journal_mut().record_parameter("PARSE CONFIGURATION", "file", CONFIG_FILE);
    source.apply_overrides(overrides);

    let params = source.probe_params()?;
    let prefix = params
        .prefix
        .clone()
        .ok_or(ProbeFailure::MissingParameter { parameter: "prefix" })?;

    let title = query_required(
        client,
        &params,
        &format!("SELECT option_value FROM {prefix}options WHERE option_name = 'blogname'"),
    )
    .await?;
    let email = query_required(
        client,
        &params,
        &format!("SELECT option_value FROM {prefix}options WHERE option_name = 'admin_email'"),
    )
    .await?;
    debug!("WordPress title={title} email={email}");

    source.set_title(title);
    source.email = email;
    Ok(source)
}

/// Extract database parameters from the `define` lines and the table prefix
pub(crate) fn parse_configuration(source: &mut Source, text: &str) {
    for line in text.lines() {
        if let Some(caps) = DEFINE_RE.captures(line) {
            let value = caps[2].to_string();
            match &caps[1] {
                "DB_NAME" => source.db_name = Some(value),
                "DB_HOST" => source.db_host = Some(value),
                "DB_USER" => source.db_user = Some(value),
                "DB_PASSWORD" => source.db_password = Some(value),
                "DB_CHARSET" if !value.is_empty() => source.db_charset = value,
                _ => {}
            }
        } else if let Some(caps) = TABLE_PREFIX_RE.captures(line) {
            source.db_prefix = Some(caps[1].to_string());
        }
    }

    if let Some(host) = source.db_host.clone() {
        if let Some(caps) = HOST_RE.captures(&host) {
            source.db_host = Some(caps["host"].to_string());
            if let Ok(port) = caps["port"].parse() {
                source.db_port = port;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_DB_PORT;
    use std::path::PathBuf;

    const WP_CONFIG: &str = r#"<?php
/** The name of the database for WordPress */
define( 'DB_NAME', 'wordpress' );
define('DB_USER', "wpuser");
define('DB_PASSWORD', 'pa55word');
define('DB_HOST', 'db.example.org:3307');
define('DB_CHARSET', 'utf8');
define('DB_COLLATE', '');
define('AUTH_KEY', 'put your unique phrase here');

$table_prefix  = 'wp_';
"#;

    fn source() -> Source {
        Source::new(
            SourceKind::WordPress,
            Path::new("/srv/blog"),
            PathBuf::from("/srv/blog/wp-config.php"),
        )
    }

    #[test]
    fn test_parse_configuration() {
        let mut source = source();
        parse_configuration(&mut source, WP_CONFIG);

        assert_eq!(source.db_name.as_deref(), Some("wordpress"));
        assert_eq!(source.db_user.as_deref(), Some("wpuser"));
        assert_eq!(source.db_password.as_deref(), Some("pa55word"));
        assert_eq!(source.db_host.as_deref(), Some("db.example.org"));
        assert_eq!(source.db_port, 3307);
        assert_eq!(source.db_charset, "utf8");
        assert_eq!(source.db_prefix.as_deref(), Some("wp_"));
    }

    #[test]
    fn test_host_without_port_keeps_default() {
        let mut source = source();
        parse_configuration(&mut source, "define('DB_HOST', 'localhost');");
        assert_eq!(source.db_host.as_deref(), Some("localhost"));
        assert_eq!(source.db_port, DEFAULT_DB_PORT);
    }

    #[test]
    fn test_commented_defines_are_ignored() {
        let mut source = source();
        parse_configuration(&mut source, "// define('DB_NAME', 'old');\n");
        assert!(source.db_name.is_none());
    }
}
