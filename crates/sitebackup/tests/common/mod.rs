//! Common test utilities for the sitebackup orchestrator
//!
//! In-memory stand-ins for the database server, the object store and the
//! mail transport, plus a WordPress fixture.

#![allow(dead_code)]

use async_trait::async_trait;
use sitebackup::{MailError, MailTransport};
use sitebackup_sources::{DatabaseError, DbParams, SqlClient};
use sitebackup_targets::{ObjectStore, StorageError};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

pub const TITLE: &str = "My Blog";
pub const SLUG: &str = "my-blog";
pub const ADMIN: &str = "admin@example.org";

/// WordPress database with two tables
#[derive(Default)]
pub struct FakeSqlClient {
    fail_dump: bool,
}

impl FakeSqlClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer identification queries but refuse listing and dumping tables
    pub fn failing_dump() -> Self {
        Self { fail_dump: true }
    }

    fn check_dump(&self, params: &DbParams) -> Result<(), DatabaseError> {
        if self.fail_dump {
            return Err(DatabaseError::AccessDenied {
                message: format!("ERROR 1045 (28000): Access denied for user '{}'", params.user),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SqlClient for FakeSqlClient {
    async fn query_scalar(
        &self,
        _params: &DbParams,
        query: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let value = if query.contains("'blogname'") {
            Some(TITLE.to_string())
        } else if query.contains("'admin_email'") {
            Some(ADMIN.to_string())
        } else {
            None
        };
        Ok(value)
    }

    async fn list_tables(&self, params: &DbParams) -> Result<Vec<String>, DatabaseError> {
        self.check_dump(params)?;
        Ok(vec!["wp_options".to_string(), "wp_posts".to_string()])
    }

    async fn dump(&self, params: &DbParams, tables: &[String]) -> Result<Vec<u8>, DatabaseError> {
        self.check_dump(params)?;
        Ok(format!("-- dump of {}\n", tables.join(", ")).into_bytes())
    }
}

/// In-memory [`ObjectStore`]
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    deleted: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a bucket holding empty objects under `keys`
    pub fn with_objects(bucket: &str, keys: &[String]) -> Self {
        let store = Self::new();
        store.buckets.lock().unwrap().insert(
            bucket.to_string(),
            keys.iter().map(|k| (k.clone(), Vec::new())).collect(),
        );
        store
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.lock().unwrap().contains_key(bucket)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.keys(bucket))
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, StorageError> {
        let data = fs::read(path).map_err(|e| StorageError::io("put_object", &e))?;
        let size = data.len() as u64;
        self.buckets
            .lock()
            .unwrap()
            .get_mut(bucket)
            .ok_or_else(|| StorageError::api("put_object", "NoSuchBucket"))?
            .insert(key.to_string(), data);
        Ok(size)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        if let Some(objects) = self.buckets.lock().unwrap().get_mut(bucket) {
            objects.remove(key);
        }
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// [`MailTransport`] keeping delivered messages
#[derive(Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, message: &[u8]) -> Result<(), MailError> {
        self.messages
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(message).into_owned());
        Ok(())
    }
}

/// WordPress installation with one page
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
    fs::write(root.join("index.php"), "<?php // front page\n").unwrap();
}

/// File names of the `.tgz` files in `dir`
pub fn archives_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tgz"))
        .collect();
    names.sort();
    names
}
