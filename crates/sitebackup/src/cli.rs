//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser};
use sitebackup_core::thinning::ThinningStrategy;

const LONG_ABOUT: &str = "\
Create a backup of a web application instance.

The instance at PATH is identified as a WordPress blog, a HumHub network or a
Vaultwarden server. The backup is a compressed tar archive containing a dump
of the application database and a copy of the installation directory.";

const AFTER_HELP: &str = "\
Database parameters are read from the configuration file of the instance and
can be overridden with the database options.

Thinning strategies:
  L<n>          keep the n most recent archives
  <d>D<w>W<m>M  keep one archive per day for d days, per week for w weeks,
                per month for m months and one per year beyond that";

/// sitebackup - back up web application instances
#[derive(Parser, Debug)]
#[command(name = "sitebackup")]
#[command(author, version, about, long_about = LONG_ABOUT, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to the web application instance
    #[arg(value_parser = existing_directory)]
    pub path: Utf8PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Do not print status messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to sitebackup.yaml config file
    #[arg(short, long)]
    pub config: Option<Utf8PathBuf>,

    /// Perform a dry run: do not store or delete any archives
    #[arg(long, visible_alias = "dry")]
    pub dry_run: bool,

    /// Back up the application database
    #[arg(long)]
    pub database: bool,

    /// Back up the application filesystem
    #[arg(long)]
    pub filesystem: bool,

    /// Thin out archives at the targets using the given strategy
    #[arg(long, value_name = "STRATEGY")]
    pub thinning: Option<ThinningStrategy>,

    #[command(flatten)]
    pub db: DatabaseArgs,

    #[command(flatten)]
    pub local: LocalArgs,

    #[command(flatten)]
    pub s3: S3Args,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Overrides for the database parameters found in the instance configuration
#[derive(Args, Debug, Default)]
#[command(next_help_heading = "Database backup options")]
pub struct DatabaseArgs {
    /// Database name
    #[arg(id = "db", long = "db", value_name = "NAME")]
    pub name: Option<String>,

    /// Database host
    #[arg(id = "dbhost", long = "dbhost", value_name = "HOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(id = "dbport", long = "dbport", value_name = "PORT")]
    pub port: Option<u16>,

    /// Database user
    #[arg(id = "dbuser", long = "dbuser", value_name = "USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(
        id = "dbpass",
        long = "dbpass",
        value_name = "PASS",
        env = "SITEBACKUP_DBPASS",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Prefix of the application tables
    #[arg(id = "dbprefix", long = "dbprefix", value_name = "PREFIX")]
    pub prefix: Option<String>,
}

#[derive(Args, Debug, Default)]
#[command(next_help_heading = "Local target")]
pub struct LocalArgs {
    /// Keep the archive in this directory instead of deleting it (default: current directory)
    #[arg(
        long,
        value_name = "DIR",
        num_args = 0..=1,
        default_missing_value = ".",
        value_parser = existing_directory
    )]
    pub attic: Option<Utf8PathBuf>,
}

#[derive(Args, Debug, Default)]
#[command(next_help_heading = "S3 target")]
pub struct S3Args {
    /// S3 service host, optionally with port
    #[arg(id = "s3", long = "s3", value_name = "HOST[:PORT]")]
    pub host: Option<String>,

    /// Access key for the S3 service
    #[arg(
        id = "s3accesskey",
        long = "s3accesskey",
        value_name = "KEY",
        env = "SITEBACKUP_S3_ACCESS_KEY",
        hide_env_values = true
    )]
    pub access_key: Option<String>,

    /// Secret key for the S3 service
    #[arg(
        id = "s3secretkey",
        long = "s3secretkey",
        value_name = "KEY",
        env = "SITEBACKUP_S3_SECRET_KEY",
        hide_env_values = true
    )]
    pub secret_key: Option<String>,

    /// Bucket name (default: slug of the instance title)
    #[arg(id = "s3bucket", long = "s3bucket", value_name = "BUCKET")]
    pub bucket: Option<String>,

    /// Region of the S3 service
    #[arg(id = "s3region", long = "s3region", value_name = "REGION")]
    pub region: Option<String>,

    /// Use plain HTTP
    #[arg(id = "s3-insecure", long = "s3-insecure")]
    pub insecure: bool,
}

#[derive(Args, Debug, Default)]
#[command(next_help_heading = "Report options")]
pub struct ReportArgs {
    /// Sender address for report mails
    #[arg(long = "mail-from", value_name = "MAIL")]
    pub from: Option<String>,

    /// Send the report to the contact address of the instance
    #[arg(long = "mail-to-admin")]
    pub to_admin: bool,

    /// Recipient address for report mails (repeatable)
    #[arg(long = "mail-to", value_name = "MAIL")]
    pub to: Vec<String>,
}

fn existing_directory(value: &str) -> Result<Utf8PathBuf, String> {
    let path = Utf8PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("'{value}' is not an existing directory"))
    }
}
