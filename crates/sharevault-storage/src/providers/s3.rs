//! S3 blob store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, info};

use sharevault_core::config::blob::S3BlobConfig;
use sharevault_core::error::{AppError, ErrorKind};
use sharevault_core::result::AppResult;
use sharevault_core::traits::blob::BlobStore;

/// Blob store backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3BlobStore {
    /// Create an S3 blob store for the configured bucket.
    ///
    /// Credentials come from the default AWS provider chain (environment,
    /// profile, instance metadata).
    pub async fn new(config: &S3BlobConfig) -> AppResult<Self> {
        info!(bucket = %config.bucket, region = %config.region, "Initializing S3 blob store");
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Ok(Self {
            client: Client::new(&sdk_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to write object: {key}"),
                    e,
                )
            })?;

        debug!(key, bytes = size, "Wrote blob");
        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to read object: {key}"),
                        service_error,
                    )
                }
            })?;

        let data = output.body.collect().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read object body: {key}"),
                e,
            )
        })?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        // S3 delete is idempotent: deleting an absent key succeeds.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete object: {key}"),
                    e,
                )
            })?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}
