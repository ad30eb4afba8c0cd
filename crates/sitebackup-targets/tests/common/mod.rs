//! Common test utilities for sitebackup-targets

#![allow(dead_code)]

use async_trait::async_trait;
use sitebackup_targets::{ObjectStore, StorageError};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

/// In-memory [`ObjectStore`] keeping object contents per bucket
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    created: Mutex<BTreeSet<String>>,
    deleted: Mutex<Vec<String>>,
    failure: Mutex<Option<StorageError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a bucket holding empty objects under `keys`
    pub fn with_objects(bucket: &str, keys: &[String]) -> Self {
        let store = Self::new();
        {
            let mut buckets = store.buckets.lock().unwrap();
            let objects = buckets.entry(bucket.to_string()).or_default();
            for key in keys {
                objects.insert(key.clone(), Vec::new());
            }
        }
        store
    }

    /// Make every following call fail with `error`
    pub fn fail_with(&self, error: StorageError) {
        *self.failure.lock().unwrap() = Some(error);
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

    /// Buckets created through the store
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().iter().cloned().collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StorageError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        self.check()?;
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.check()?;
        self.buckets
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default();
        self.created.lock().unwrap().insert(bucket.to_string());
        Ok(())
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        self.check()?;
        Ok(self.keys(bucket))
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, StorageError> {
        self.check()?;
        let data = std::fs::read(path).map_err(|e| StorageError::io("put_object", &e))?;
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
        self.check()?;
        if let Some(objects) = self.buckets.lock().unwrap().get_mut(bucket) {
            objects.remove(key);
        }
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}
