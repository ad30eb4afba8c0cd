//! Source detection

use crate::database::SqlClient;
use crate::error::{ProbeError, ProbeFailure, SourceError};
use crate::types::{DbParams, Source, SourceConfig, SourceKind};
use crate::{humhub, vaultwarden, wordpress};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Creates the [`Source`] for an installation directory
///
/// Variants are probed in the order of [`SourceKind::ALL`]; the first one
/// that succeeds wins. If none does, every rejection reason is returned.
pub struct SourceFactory {
    path: PathBuf,
    client: Arc<dyn SqlClient>,
}

impl SourceFactory {
    pub fn new(path: impl Into<PathBuf>, client: Arc<dyn SqlClient>) -> Self {
        Self {
            path: path.into(),
            client,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn create(&self, overrides: &SourceConfig) -> Result<Source, SourceError> {
        let mut failures = Vec::new();

        for kind in SourceKind::ALL {
            match self.probe(kind, overrides).await {
                Ok(source) => {
                    info!("Found {} '{}' at {}", kind, source.title, self.path.display());
                    return Ok(source);
                }
                Err(err) if err.is_not_found() => {
                    debug!("{err}");
                    failures.push(err);
                }
                Err(err) => {
                    warn!("{err}");
                    failures.push(err);
                }
            }
        }

        Err(SourceError::NoMatch {
            path: self.path.clone(),
            failures,
        })
    }

    async fn probe(&self, kind: SourceKind, overrides: &SourceConfig) -> Result<Source, ProbeError> {
        let client = self.client.as_ref();
        match kind {
            SourceKind::WordPress => wordpress::probe(&self.path, overrides, client).await,
            SourceKind::HumHub => humhub::probe(&self.path, overrides, client).await,
            SourceKind::Vaultwarden => vaultwarden::probe(&self.path),
        }
    }
}

/// Path of a variant's configuration file if the installation looks complete
pub(crate) fn locate_config(path: &Path, relative: &str) -> Result<PathBuf, ProbeFailure> {
    let config = path.join(relative);
    if path.is_dir() && config.is_file() {
        Ok(config)
    } else {
        Err(ProbeFailure::NotFound { config })
    }
}

pub(crate) fn read_config(config: &Path) -> Result<String, ProbeFailure> {
    fs::read_to_string(config).map_err(|e| ProbeFailure::InvalidConfig {
        config: config.to_path_buf(),
        message: e.to_string(),
    })
}

/// Run an identification query that must return a row
pub(crate) async fn query_required(
    client: &dyn SqlClient,
    params: &DbParams,
    query: &str,
) -> Result<String, ProbeFailure> {
    client
        .query_scalar(params, query)
        .await?
        .ok_or_else(|| ProbeFailure::MissingRow {
            query: query.to_string(),
        })
}
