//! Wiring of command line, configuration file and collaborators

use crate::backup::{Backup, BackupOptions};
use crate::cli::Cli;
use crate::mail::Mailer;
use crate::output;
use anyhow::{bail, Context, Result};
use sitebackup_core::config::SiteBackupConfig;
use sitebackup_sources::{MysqlClient, Source, SourceConfig, SourceFactory, SqlClient};
use sitebackup_targets::{AwsObjectStore, S3Endpoint, S3Target, Target};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// S3 target parameters
#[derive(Debug, Clone)]
pub struct S3Options {
    pub endpoint: S3Endpoint,

    /// Bucket; the source slug when unset
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailOptions {
    pub from: String,
    pub to: Vec<String>,

    /// Also send to the contact address of the source
    pub to_admin: bool,
}

/// Command line merged over the configuration file
#[derive(Debug, Clone)]
pub struct Settings {
    pub path: PathBuf,
    pub overrides: SourceConfig,
    pub options: BackupOptions,
    pub s3: Option<S3Options>,
    pub mail: Option<MailOptions>,
    pub quiet: bool,
}

impl Settings {
    /// Command line values take precedence over the file
    pub fn resolve(cli: &Cli, config: &SiteBackupConfig) -> Result<Self> {
        let thinning = match cli.thinning {
            Some(strategy) => Some(strategy),
            None => config.thinning_strategy()?,
        };

        let attic = match (&cli.local.attic, &config.attic) {
            (Some(attic), _) => Some(attic.clone()),
            (None, Some(attic)) => {
                if !attic.is_dir() {
                    bail!("Attic '{attic}' is not an existing directory");
                }
                Some(attic.clone())
            }
            (None, None) => None,
        };

        let s3 = cli
            .s3
            .host
            .as_ref()
            .or(config.s3.host.as_ref())
            .map(|host| S3Options {
                endpoint: S3Endpoint::new(host)
                    .with_port(config.s3.port)
                    .with_secure(config.s3.secure && !cli.s3.insecure)
                    .with_region(cli.s3.region.clone().unwrap_or_else(|| config.s3.region.clone()))
                    .with_credentials(
                        cli.s3.access_key.clone().or_else(|| config.s3.access_key.clone()),
                        cli.s3.secret_key.clone().or_else(|| config.s3.secret_key.clone()),
                    ),
                bucket: cli.s3.bucket.clone().or_else(|| config.s3.bucket.clone()),
            });

        let mail = cli
            .report
            .from
            .as_ref()
            .or(config.mail.from.as_ref())
            .map(|from| MailOptions {
                from: from.clone(),
                to: config
                    .mail
                    .to
                    .iter()
                    .chain(&cli.report.to)
                    .cloned()
                    .collect(),
                to_admin: cli.report.to_admin || config.mail.to_admin,
            });

        Ok(Self {
            path: cli.path.clone().into_std_path_buf(),
            overrides: SourceConfig {
                dbname: cli.db.name.clone(),
                dbhost: cli.db.host.clone(),
                dbport: cli.db.port,
                dbuser: cli.db.user.clone(),
                dbpass: cli.db.password.clone(),
                dbprefix: cli.db.prefix.clone(),
            },
            options: BackupOptions {
                database: cli.database,
                filesystem: cli.filesystem,
                thinning,
                attic: attic.map(|a| a.into_std_path_buf()),
                dry_run: cli.dry_run,
                ..BackupOptions::default()
            },
            s3,
            mail,
            quiet: cli.quiet,
        })
    }
}

/// Mailer for the report, or `None` without a sender
pub fn build_mailer(mail: Option<&MailOptions>, source: &Source) -> Option<Mailer> {
    let mail = mail?;
    let mut mailer = Mailer::new();
    mailer.set_sender(&mail.from);
    if mail.to_admin {
        mailer.add_recipient(&source.email);
    }
    for recipient in &mail.to {
        mailer.add_recipient(recipient);
    }
    Some(mailer)
}

async fn build_targets(settings: &Settings, source: &Source) -> Vec<Box<dyn Target>> {
    let mut targets: Vec<Box<dyn Target>> = Vec::new();

    if let Some(s3) = &settings.s3 {
        let bucket = s3.bucket.clone().unwrap_or_else(|| source.slug.clone());
        let store = AwsObjectStore::connect(&s3.endpoint).await;
        let target = S3Target::new(&s3.endpoint.host, bucket, Arc::new(store))
            .with_progress(!settings.quiet);
        targets.push(Box::new(target));
    }

    for target in &targets {
        info!("Target is {}", target.description());
    }
    targets
}

/// Run one backup as described by the command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = SiteBackupConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let settings = Settings::resolve(&cli, &config)?;

    let client: Arc<dyn SqlClient> = Arc::new(MysqlClient::new());
    let source = SourceFactory::new(&settings.path, Arc::clone(&client))
        .create(&settings.overrides)
        .await
        .with_context(|| format!("Cannot back up {}", settings.path.display()))?;
    info!("Source is {}", source.description);

    let mut targets = build_targets(&settings, &source).await;
    let mailer = build_mailer(settings.mail.as_ref(), &source);

    let mut backup = Backup::new(source, client)
        .with_mailer(mailer)
        .quiet(settings.quiet);
    backup
        .execute(&mut targets, &settings.options)
        .await
        .with_context(|| format!("Backup of {} failed", backup.source().description))?;

    if !settings.quiet {
        output::success(&format!(
            "Backup of {} completed",
            backup.source().description
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use clap::Parser;
    use sitebackup_core::thinning::ThinningStrategy;
    use tempfile::TempDir;

    fn cli(site: &TempDir, args: &[&str]) -> Cli {
        let path = site.path().to_str().unwrap();
        Cli::try_parse_from(
            std::iter::once("sitebackup")
                .chain(args.iter().copied())
                .chain(std::iter::once(path)),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let site = TempDir::new().unwrap();
        let settings = Settings::resolve(&cli(&site, &["--database"]), &SiteBackupConfig::default()).unwrap();

        assert!(settings.options.database);
        assert!(!settings.options.filesystem);
        assert!(settings.options.thinning.is_none());
        assert!(settings.s3.is_none());
        assert!(settings.mail.is_none());
        assert_eq!(settings.overrides, SourceConfig::default());
    }

    #[test]
    fn test_command_line_overrides_config() {
        let site = TempDir::new().unwrap();
        let config = SiteBackupConfig::parse(
            "s3:\n  host: s3.example.org\n  bucket: from-file\n  access_key: AK\nthinning: L5\n",
        )
        .unwrap();

        let settings = Settings::resolve(
            &cli(&site, &["--thinning", "2D3W2M", "--s3bucket", "from-cli", "--dbuser", "root"]),
            &config,
        )
        .unwrap();

        assert_eq!(settings.options.thinning, Some(ThinningStrategy::tiered(2, 3, 2).unwrap()));
        let s3 = settings.s3.unwrap();
        assert_eq!(s3.endpoint.host, "s3.example.org");
        assert_eq!(s3.bucket.as_deref(), Some("from-cli"));
        assert_eq!(s3.endpoint.access_key.as_deref(), Some("AK"));
        assert_eq!(settings.overrides.dbuser.as_deref(), Some("root"));
    }

    #[test]
    fn test_config_fills_missing_values() {
        let site = TempDir::new().unwrap();
        let attic = TempDir::new().unwrap();
        let attic_path = Utf8PathBuf::try_from(attic.path().to_path_buf()).unwrap();
        let config = SiteBackupConfig::parse(&format!(
            "s3:\n  host: minio.local:9000\n  secure: false\nmail:\n  from: backup@example.org\n  to: [ops@example.org]\nthinning: 7D4W12M\nattic: {attic_path}\n"
        ))
        .unwrap();

        let settings = Settings::resolve(&cli(&site, &["--mail-to", "dev@example.org"]), &config).unwrap();

        assert_eq!(settings.options.thinning, Some(ThinningStrategy::tiered(7, 4, 12).unwrap()));
        assert_eq!(settings.options.attic.as_deref(), Some(attic.path()));
        assert_eq!(settings.s3.unwrap().endpoint.url(), "http://minio.local:9000");
        assert_eq!(
            settings.mail,
            Some(MailOptions {
                from: "backup@example.org".into(),
                to: vec!["ops@example.org".into(), "dev@example.org".into()],
                to_admin: false,
            })
        );
    }

    #[test]
    fn test_insecure_flag_disables_https() {
        let site = TempDir::new().unwrap();
        let settings = Settings::resolve(
            &cli(&site, &["--s3", "s3.example.org", "--s3-insecure"]),
            &SiteBackupConfig::default(),
        )
        .unwrap();
        assert_eq!(settings.s3.unwrap().endpoint.url(), "http://s3.example.org");
    }

    #[test]
    fn test_rejects_missing_attic_from_config() {
        let site = TempDir::new().unwrap();
        let config = SiteBackupConfig::parse("attic: /nonexistent/attic\n").unwrap();
        let err = Settings::resolve(&cli(&site, &[]), &config).unwrap_err();
        assert!(err.to_string().contains("is not an existing directory"));
    }
}
