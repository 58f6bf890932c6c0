//! Blob store trait for pluggable object storage backends.
//!
//! The blob store is an external collaborator: it holds opaque file bytes
//! addressed by a key (the `locator` on a file record) and knows nothing
//! about grants or sharing. Keys are namespaced `uploads/{user_id}/{uuid}.{ext}`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for blob storage backends.
///
/// Implementations exist for the local filesystem, S3, and an in-memory
/// store used by tests. The trait is defined here in `sharevault-core` and
/// implemented in `sharevault-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write an object under the given key.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()>;

    /// Read an object into memory as a complete byte vector.
    async fn read(&self, key: &str) -> AppResult<Bytes>;

    /// Delete the object at the given key. Deleting an absent key is not
    /// an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Return the publicly addressable URL for a key.
    ///
    /// The URL is a deterministic function of the provider's location
    /// (bucket, region, root) and the key.
    fn object_url(&self, key: &str) -> String;
}
