//! In-memory document store, used by tests and single-node development.

use dashmap::DashMap;
use uuid::Uuid;

use async_trait::async_trait;

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;
use sharevault_core::types::id::{FileId, UserId};
use sharevault_entity::user::UserDocument;

use crate::document::{DocumentStore, VersionedDocument};

/// A stored document with its version counter.
#[derive(Debug, Clone)]
struct StoredDocument {
    document: UserDocument,
    version: i64,
}

/// In-memory [`DocumentStore`] over a concurrent map.
///
/// Compare-and-swap semantics match the Postgres provider: `store_if`
/// writes only under the expected version, atomically per document (the
/// map shard lock covers the compare and the write).
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<Uuid, StoredDocument>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, user_id: UserId) -> AppResult<Option<VersionedDocument>> {
        Ok(self.documents.get(user_id.as_uuid()).map(|stored| {
            VersionedDocument {
                document: stored.document.clone(),
                version: stored.version,
            }
        }))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<VersionedDocument>> {
        Ok(self
            .documents
            .iter()
            .find(|entry| entry.document.email_matches(email))
            .map(|entry| VersionedDocument {
                document: entry.document.clone(),
                version: entry.version,
            }))
    }

    async fn insert(&self, document: UserDocument) -> AppResult<()> {
        let key = document.id.into_uuid();
        match self.documents.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::conflict(format!(
                "User document already exists: {}",
                document.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(StoredDocument {
                    document,
                    version: 0,
                });
                Ok(())
            }
        }
    }

    async fn store_if(&self, document: &UserDocument, expected_version: i64) -> AppResult<bool> {
        match self.documents.get_mut(document.id.as_uuid()) {
            Some(mut stored) => {
                if stored.version != expected_version {
                    return Ok(false);
                }
                stored.document = document.clone();
                stored.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn shared_view_holders(&self, file_id: FileId) -> AppResult<Vec<UserId>> {
        Ok(self
            .documents
            .iter()
            .filter(|entry| {
                entry
                    .document
                    .files_shared_with
                    .iter()
                    .any(|e| e.file_id == file_id)
            })
            .map(|entry| entry.document.id)
            .collect())
    }
}
