use std::time::Duration;

use async_trait::async_trait;
use s3::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;

use super::error::StorageError;
use super::key::validate_key;
use super::traits::BlobStore;

/// S3-backed blob store.
///
/// Presigned GET URLs are produced by the bucket itself, so downloads never
/// pass through the service.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

impl S3BlobStore {
    /// Connect to a bucket. A custom `endpoint` (MinIO, localstack) switches
    /// the client to path-style addressing.
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key: &str,
        secret_key: &str,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let bucket = match endpoint {
            Some(endpoint) => {
                let region = Region::Custom {
                    region: region.to_string(),
                    endpoint: endpoint.to_string(),
                };
                Bucket::new(bucket_name, region, credentials)
                    .map_err(|e| StorageError::Backend(e.to_string()))?
                    .with_path_style()
            }
            None => {
                let region = region
                    .parse::<Region>()
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
                Bucket::new(bucket_name, region, credentials)
                    .map_err(|e| StorageError::Backend(e.to_string()))?
            }
        };

        Ok(Self { bucket, max_size })
    }

    fn map_err(key: &str, err: S3Error) -> StorageError {
        match err {
            S3Error::HttpFailWithBody(404, _) => StorageError::NotFound(key.to_string()),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = validate_key(key)?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        self.bucket
            .put_object(key, data)
            .await
            .map_err(|e| Self::map_err(key, e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let key = validate_key(key)?;
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| Self::map_err(key, e))?;
        Ok(response.to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        match self.bucket.head_object(key).await {
            Ok((_, 200)) => Ok(true),
            Ok((_, 404)) => Ok(false),
            Ok((_, code)) => Err(StorageError::Backend(format!(
                "unexpected HEAD status {code} for {key}"
            ))),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        if !self.exists(key).await? {
            return Ok(false);
        }
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| Self::map_err(key, e))?;
        Ok(true)
    }

    async fn presign_get(&self, key: &str, expiry: Duration) -> Result<String, StorageError> {
        let key = validate_key(key)?;
        let expiry_secs = u32::try_from(expiry.as_secs()).unwrap_or(u32::MAX);
        self.bucket
            .presign_get(key, expiry_secs, None)
            .await
            .map_err(|e| Self::map_err(key, e))
    }
}
