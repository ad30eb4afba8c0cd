//! Integration tests for source detection

mod common;

use common::*;
use sitebackup_sources::{ProbeFailure, Source, SourceConfig, SourceError, SourceFactory, SourceKind};
use std::sync::Arc;
use tempfile::TempDir;

async fn create(
    root: &TempDir,
    client: Arc<FakeSqlClient>,
    overrides: &SourceConfig,
) -> Result<Source, SourceError> {
    SourceFactory::new(root.path(), client).create(overrides).await
}

#[tokio::test]
async fn test_wordpress_is_identified() {
    let root = TempDir::new().unwrap();
    write_wordpress(root.path());
    let client = Arc::new(wordpress_client("My Blog", "admin@example.org"));

    let source = create(&root, client.clone(), &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(source.kind, SourceKind::WordPress);
    assert_eq!(source.title, "My Blog");
    assert_eq!(source.slug, "my-blog");
    assert_eq!(source.description, "WordPress Blog 'My Blog'");
    assert_eq!(source.email, "admin@example.org");
    assert_eq!(source.db_name.as_deref(), Some("wordpress"));
    assert_eq!(source.db_prefix.as_deref(), Some("wp_"));

    let queries = client.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].contains("FROM wp_options"));
}

#[tokio::test]
async fn test_overrides_apply_before_querying() {
    let root = TempDir::new().unwrap();
    write_wordpress(root.path());
    let client = Arc::new(wordpress_client("Blog", "admin@example.org"));
    let overrides = SourceConfig {
        dbhost: Some("db.internal".into()),
        dbport: Some(3310),
        dbprefix: Some("blog_".into()),
        ..Default::default()
    };

    let source = create(&root, client.clone(), &overrides).await.unwrap();

    assert_eq!(source.db_host.as_deref(), Some("db.internal"));
    let connection = &client.connections()[0];
    assert_eq!(connection.host, "db.internal");
    assert_eq!(connection.port, 3310);
    assert_eq!(connection.user, "wpuser");
    assert!(client.queries()[0].contains("FROM blog_options"));
}

#[tokio::test]
async fn test_humhub_title_comes_from_database() {
    let root = TempDir::new().unwrap();
    write_humhub(root.path());
    let client = Arc::new(
        FakeSqlClient::new()
            .with_row("name = 'name'", "Team Space")
            .with_row("'mailer.systemEmailAddress'", "hh@example.org"),
    );

    let source = create(&root, client.clone(), &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(source.kind, SourceKind::HumHub);
    assert_eq!(source.title, "Team Space");
    assert_eq!(source.slug, "team-space");
    assert_eq!(source.email, "hh@example.org");
    assert!(client.queries()[0].contains("FROM setting"));
}

#[tokio::test]
async fn test_vaultwarden_needs_no_database() {
    let root = TempDir::new().unwrap();
    write_vaultwarden(root.path());
    let client = Arc::new(FakeSqlClient::new());

    let source = create(&root, client.clone(), &SourceConfig::default())
        .await
        .unwrap();

    assert_eq!(source.kind, SourceKind::Vaultwarden);
    assert!(!source.has_database());
    assert!(client.connections().is_empty());
}

#[tokio::test]
async fn test_no_match_lists_failures_in_probe_order() {
    let root = TempDir::new().unwrap();
    let client = Arc::new(FakeSqlClient::new());

    let err = create(&root, client, &SourceConfig::default())
        .await
        .unwrap_err();

    let SourceError::NoMatch { failures, .. } = &err;
    let kinds: Vec<_> = failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, SourceKind::ALL.to_vec());
    assert!(failures.iter().all(|f| f.is_not_found()));

    let message = err.to_string();
    assert!(message.contains("No supported application found"));
    assert!(message.contains("WordPress: no installation found"));
    assert!(message.contains("Vaultwarden: no installation found"));
}

#[tokio::test]
async fn test_access_denied_is_reported_for_the_variant() {
    let root = TempDir::new().unwrap();
    write_wordpress(root.path());
    let client = Arc::new(FakeSqlClient::new().denying_access());

    let SourceError::NoMatch { failures, .. } = create(&root, client, &SourceConfig::default())
        .await
        .unwrap_err();

    assert_eq!(failures.len(), 3);
    assert_eq!(failures[0].kind, SourceKind::WordPress);
    assert!(matches!(
        &failures[0].reason,
        ProbeFailure::Database(e) if e.is_access_denied()
    ));
    assert!(failures[1].is_not_found());
    assert!(failures[2].is_not_found());
}

#[tokio::test]
async fn test_missing_row_rejects_variant() {
    let root = TempDir::new().unwrap();
    write_wordpress(root.path());
    let client = Arc::new(FakeSqlClient::new().with_row("'blogname'", "Blog"));

    let SourceError::NoMatch { failures, .. } = create(&root, client, &SourceConfig::default())
        .await
        .unwrap_err();

    match &failures[0].reason {
        ProbeFailure::MissingRow { query } => assert!(query.contains("admin_email")),
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_wordpress_without_prefix_is_rejected() {
    let root = TempDir::new().unwrap();
    std::fs::write(
        root.path().join("wp-config.php"),
        "define('DB_NAME', 'wp');\ndefine('DB_USER', 'u');\ndefine('DB_PASSWORD', 'p');\ndefine('DB_HOST', 'h');\n",
    )
    .unwrap();
    let client = Arc::new(wordpress_client("Blog", "a@b.c"));

    let SourceError::NoMatch { failures, .. } = create(&root, client, &SourceConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(
        failures[0].reason,
        ProbeFailure::MissingParameter { parameter: "prefix" }
    ));
}

#[tokio::test]
async fn test_wordpress_without_password_is_rejected() {
    let root = TempDir::new().unwrap();
    std::fs::write(
        root.path().join("wp-config.php"),
        "define('DB_NAME', 'wp');\ndefine('DB_USER', 'u');\ndefine('DB_HOST', 'h');\n$table_prefix = 'wp_';\n",
    )
    .unwrap();
    let client = Arc::new(wordpress_client("Blog", "a@b.c"));

    let SourceError::NoMatch { failures, .. } = create(&root, client.clone(), &SourceConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(
        failures[0].reason,
        ProbeFailure::MissingParameter {
            parameter: "password"
        }
    ));
    assert!(client.connections().is_empty());
}
