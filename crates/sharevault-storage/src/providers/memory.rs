//! In-memory blob store, used by tests.

use dashmap::DashMap;

use async_trait::async_trait;
use bytes::Bytes;

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;
use sharevault_core::traits::blob::BlobStore;

/// Blob store that keeps objects in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently held.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether an object exists under the given key.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> AppResult<()> {
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Bytes> {
        self.objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.objects.remove(key);
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}
