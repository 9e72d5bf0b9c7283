use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageError;

/// Key-addressed blob storage.
///
/// Keys are caller-derived relative paths (e.g. `resumes/{uuid}`), so
/// writing the same key twice overwrites the object in place. Downloads
/// happen through time-limited presigned URLs rather than through the
/// service; backends that cannot produce a real signed URL (filesystem)
/// return a best-effort local URL suitable for development only.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under the given key, replacing any existing object.
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes of the object under the given key.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists under the given key.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete the object under the given key.
    ///
    /// Returns `true` if an object was deleted, `false` if none existed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Produce a URL granting direct GET access to the object for `expiry`.
    async fn presign_get(&self, key: &str, expiry: Duration) -> Result<String, StorageError>;
}
