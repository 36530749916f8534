//! Object Store boundary: durable binary storage that returns a public URL.

use async_trait::async_trait;
use s3_utils::S3Operations;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object store unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend used by the media pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store the file at `source` under `key`; returns its public URL
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> Result<String, ObjectStoreError>;

    /// Store an in-memory buffer under `key`; returns its public URL
    async fn put_bytes(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError>;

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}

/// S3-backed object store
pub struct S3ObjectStore {
    ops: S3Operations,
}

impl S3ObjectStore {
    pub fn new(ops: S3Operations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        self.ops
            .upload_path(key, source, content_type)
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))
    }

    async fn put_bytes(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        self.ops
            .upload_file(key, bytes, content_type)
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.ops
            .delete_file(key)
            .await
            .map_err(|e| ObjectStoreError::Unavailable(e.to_string()))
    }
}
