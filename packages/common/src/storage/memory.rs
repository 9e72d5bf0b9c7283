use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageError;
use super::key::validate_key;
use super::traits::BlobStore;

/// In-memory blob store for tests and throwaway deployments.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = validate_key(key)?;
        self.objects
            .write()
            .expect("store lock poisoned")
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let key = validate_key(key)?;
        self.objects
            .read()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        Ok(self
            .objects
            .read()
            .expect("store lock poisoned")
            .contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        Ok(self
            .objects
            .write()
            .expect("store lock poisoned")
            .remove(key)
            .is_some())
    }

    async fn presign_get(&self, key: &str, expiry: Duration) -> Result<String, StorageError> {
        let key = validate_key(key)?;
        if !self
            .objects
            .read()
            .expect("store lock poisoned")
            .contains_key(key)
        {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!(
            "memory://{key}?expires_in={}",
            expiry.as_secs()
        ))
    }
}
