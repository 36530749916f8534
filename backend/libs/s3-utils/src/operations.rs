/// S3 operations for media upload and removal
use crate::config::S3Config;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    #[error("failed to read upload source: {0}")]
    Source(String),

    #[error("S3 request failed: {0}")]
    Request(String),
}

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Upload an in-memory buffer; returns the public URL
    pub async fn upload_file(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, S3Error> {
        self.put(key, ByteStream::from(body), content_type).await
    }

    /// Upload a file from disk without buffering it in memory; returns the public URL
    pub async fn upload_path(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<String, S3Error> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| S3Error::Source(e.to_string()))?;
        self.put(key, body, content_type).await
    }

    async fn put(&self, key: &str, body: ByteStream, content_type: &str) -> Result<String, S3Error> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| S3Error::Request(e.to_string()))?;

        tracing::debug!(key, content_type, "Object uploaded");
        Ok(self.config.object_url(key))
    }

    /// Delete an object; deleting a missing key succeeds
    pub async fn delete_file(&self, key: &str) -> Result<(), S3Error> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| S3Error::Request(e.to_string()))?;

        tracing::debug!(key, "Object deleted");
        Ok(())
    }

    /// Health check for S3 connectivity
    pub async fn health_check(&self) -> Result<(), S3Error> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| S3Error::Request(e.to_string()))?;
        Ok(())
    }
}
