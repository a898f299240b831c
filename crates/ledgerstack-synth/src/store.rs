//! Object storage collaborator.
//!
//! The seam through which anything outside the graph touches bucket
//! contents: the deploy step that uploads the compose descriptor, and the
//! restore flow's bucket listing. [`MemoryStore`] backs tests and dry runs.

use std::collections::BTreeMap;

use thiserror::Error;

use ledgerstack_bootstrap::latest_key;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such bucket: {0}")]
    NoSuchBucket(String),

    #[error("no such key in {bucket}: {key}")]
    NoSuchKey { bucket: String, key: String },
}

pub trait ObjectStore {
    fn put(&mut self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Keys in the bucket, lexicographically ordered.
    fn list(&self, bucket: &str) -> Result<Vec<String>, StoreError>;
}

/// Which backup the restore flow would pull, if any.
///
/// Mirrors the selection the bootstrap script performs on the node: the
/// lexicographically last key is the newest; an empty bucket skips restore.
pub fn find_latest_backup(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<Option<String>, StoreError> {
    let keys = store.list(bucket)?;
    Ok(latest_key(&keys).map(str::to_string))
}

/// In-memory store. Buckets must be created before use, matching how a
/// real store rejects writes to nonexistent buckets.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_bucket(&mut self, bucket: &str) {
        self.buckets.entry(bucket.to_string()).or_default();
    }
}

impl ObjectStore for MemoryStore {
    fn put(&mut self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let objects = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        objects.insert(key.to_string(), bytes);
        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchKey {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn list(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let mut store = MemoryStore::new();
        store.create_bucket("env");
        store.put("env", "docker-compose.yml", b"services: {}".to_vec()).unwrap();
        assert_eq!(store.get("env", "docker-compose.yml").unwrap(), b"services: {}");
    }

    #[test]
    fn test_missing_bucket_rejected() {
        let mut store = MemoryStore::new();
        let err = store.put("nope", "k", vec![]).unwrap_err();
        assert!(matches!(err, StoreError::NoSuchBucket(_)));
    }

    #[test]
    fn test_list_is_ordered() {
        let mut store = MemoryStore::new();
        store.create_bucket("backup");
        store.put("backup", "backup_20240201.tar.gz", vec![2]).unwrap();
        store.put("backup", "backup_20240101.tar.gz", vec![1]).unwrap();
        assert_eq!(
            store.list("backup").unwrap(),
            vec![
                "backup_20240101.tar.gz".to_string(),
                "backup_20240201.tar.gz".to_string(),
            ]
        );
    }

    #[test]
    fn test_find_latest_backup() {
        let mut store = MemoryStore::new();
        store.create_bucket("backup");
        store.put("backup", "backup_20240101.tar.gz", vec![1]).unwrap();
        store.put("backup", "backup_20240201.tar.gz", vec![2]).unwrap();
        assert_eq!(
            find_latest_backup(&store, "backup").unwrap(),
            Some("backup_20240201.tar.gz".to_string())
        );
    }

    #[test]
    fn test_find_latest_backup_empty_bucket() {
        let mut store = MemoryStore::new();
        store.create_bucket("backup");
        assert_eq!(find_latest_backup(&store, "backup").unwrap(), None);
    }
}
