//! Integration tests for the database and filesystem collaborators

mod common;

use common::*;
use flate2::read::GzDecoder;
use sitebackup_archive::Archive;
use sitebackup_core::report::{Outcome, Reportable};
use sitebackup_sources::{Database, DatabaseError, DbParams, Filesystem, DEFAULT_CHARSET};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn params(prefix: Option<&str>) -> DbParams {
    DbParams {
        name: "wordpress".into(),
        host: "localhost".into(),
        port: 3306,
        user: "wpuser".into(),
        password: "secret".into(),
        prefix: prefix.map(str::to_string),
        charset: DEFAULT_CHARSET.into(),
    }
}

fn entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (name, data)
        })
        .collect()
}

#[tokio::test]
async fn test_dump_is_stored_as_sql_entry() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(
        FakeSqlClient::new()
            .with_tables(&["wp_options", "wp_posts", "other_table"])
            .with_dump(b"CREATE TABLE wp_options;\n"),
    );
    let mut database = Database::new(params(Some("wp_")), client);
    let mut archive = Archive::new("blog").in_directory(dir.path());
    archive.open().unwrap();

    let result = database.dump_to_archive(&mut archive).await.unwrap();
    archive.close().unwrap();

    assert_eq!(result.tables, 2);
    assert_eq!(result.size, 25);
    assert_eq!(
        database.journal().outcomes("DUMP TO ARCHIVE").next(),
        Some(&Outcome::Success(
            "Result(size=25 B, numberOfTables=2)".to_string()
        ))
    );

    let entries = entries(&archive.path());
    let expected = format!("{}-db.sql", archive.name());
    let (_, data) = entries
        .iter()
        .find(|(name, _)| *name == expected)
        .expect("dump entry");
    assert_eq!(data.as_slice(), b"CREATE TABLE wp_options;\n");
}

#[tokio::test]
async fn test_no_tables_is_an_error() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(FakeSqlClient::new().with_tables(&["other_table"]));
    let mut database = Database::new(params(Some("wp_")), client);
    let mut archive = Archive::new("blog").in_directory(dir.path());
    archive.open().unwrap();

    let err = database.dump_to_archive(&mut archive).await.unwrap_err();

    assert!(matches!(err, DatabaseError::NoTables { ref database } if database == "wordpress"));
    assert_eq!(
        database.journal().outcomes("DUMP TO ARCHIVE").next(),
        Some(&Outcome::Failure)
    );
    archive.remove().unwrap();
}

#[tokio::test]
async fn test_access_denied_propagates() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(FakeSqlClient::new().denying_access());
    let mut database = Database::new(params(None), client);
    let mut archive = Archive::new("blog").in_directory(dir.path());
    archive.open().unwrap();

    let err = database.dump_to_archive(&mut archive).await.unwrap_err();
    assert!(err.is_access_denied());
    assert!(err.to_string().contains("ERROR 1045"));
    archive.remove().unwrap();
}

#[test]
fn test_filesystem_tree_lands_under_archive_name() {
    let site = TempDir::new().unwrap();
    fs::create_dir_all(site.path().join("wp-content/uploads")).unwrap();
    fs::write(site.path().join("index.php"), "<?php\n").unwrap();
    fs::write(site.path().join("wp-content/uploads/a.txt"), "a").unwrap();

    let out = TempDir::new().unwrap();
    let mut archive = Archive::new("blog").in_directory(out.path());
    archive.open().unwrap();

    let mut filesystem = Filesystem::new(site.path()).unwrap();
    filesystem.add_to_archive(&mut archive).unwrap();
    archive.close().unwrap();

    let name = archive.name();
    let names: Vec<String> = entries(&archive.path())
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert!(names.contains(&format!("{name}/index.php")));
    assert!(names.contains(&format!("{name}/wp-content/uploads/a.txt")));
    assert!(names.iter().all(|n| n.starts_with(&name)));
    assert_eq!(
        filesystem.journal().outcomes("ADD TO ARCHIVE").next(),
        Some(&Outcome::Success("OK".to_string()))
    );
}
