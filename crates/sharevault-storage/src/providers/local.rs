//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use sharevault_core::error::{AppError, ErrorKind};
use sharevault_core::result::AppResult;
use sharevault_core::traits::blob::BlobStore;

/// Blob store backed by a directory on the local filesystem.
///
/// Keys map directly to paths under the root, so `uploads/{user}/{name}`
/// becomes a nested directory tree.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored objects.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a local blob store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a key to an absolute path within the root.
    fn resolve(&self, key: &str) -> PathBuf {
        let clean = key.trim_start_matches('/');
        self.root.join(clean)
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> AppResult<()> {
        let full_path = self.resolve(key);
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write object: {key}"),
                e,
            )
        })?;

        debug!(key, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(key);
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read object: {key}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.resolve(key);
        if full_path.exists() {
            fs::remove_file(&full_path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete object: {key}"),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("file://{}", self.resolve(key).display())
    }
}
