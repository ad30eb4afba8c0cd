//! Vaultwarden instances, identified by `config.json`
//!
//! Vaultwarden keeps its data in SQLite inside the data directory, so the
//! filesystem backup covers it and no database parameters are set.

use crate::error::{ProbeError, ProbeFailure};
use crate::factory::{locate_config, read_config};
use crate::types::{Source, SourceKind};
use serde::Deserialize;
use std::path::Path;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize)]
struct VaultwardenConfig {
    domain: String,
    smtp_from: String,
}

/// Probe `path` for a Vaultwarden data directory
pub fn probe(path: &Path) -> Result<Source, ProbeError> {
    identify(path).map_err(|reason| ProbeError::new(SourceKind::Vaultwarden, reason))
}

fn identify(path: &Path) -> Result<Source, ProbeFailure> {
    let config = locate_config(path, CONFIG_FILE)?;
    let text = read_config(&config)?;

    let parsed: VaultwardenConfig =
        serde_json::from_str(&text).map_err(|e| ProbeFailure::InvalidConfig {
            config: config.clone(),
            message: e.to_string(),
        })?;

    let mut source = Source::new(SourceKind::Vaultwarden, path, config);
    source.journal_mut().record_parameter("PARSE CONFIGURATION", "file", CONFIG_FILE);
    source.set_title(parsed.domain);
    source.email = parsed.smtp_from;
    Ok(source)
}
