//! Atomic read-modify-write access to user documents.
//!
//! `GrantStore` is the only path services use to mutate grant state. Every
//! mutation is a closure applied to a freshly loaded document and written
//! back conditionally; on a version conflict the cycle re-runs against the
//! new state, so a lost update can never silently drop a concurrent share
//! or revoke.

use std::sync::Arc;

use tracing::warn;

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;
use sharevault_core::types::id::{FileId, UserId};
use sharevault_entity::file::FileRecord;
use sharevault_entity::shared_view::SharedViewEntry;
use sharevault_entity::user::UserDocument;

use crate::document::DocumentStore;

/// Attempts per read-modify-write cycle before giving up with `Conflict`.
const MAX_CAS_ATTEMPTS: u32 = 5;

/// Store facade exposing atomic mutations of one user's document.
#[derive(Debug, Clone)]
pub struct GrantStore {
    /// The underlying document store.
    store: Arc<dyn DocumentStore>,
}

impl GrantStore {
    /// Create a new grant store over a document store backend.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load a user's document, failing with `NotFound` when absent.
    pub async fn load(&self, user_id: UserId) -> AppResult<UserDocument> {
        self.store
            .load(user_id)
            .await?
            .map(|v| v.document)
            .ok_or_else(|| AppError::not_found(format!("User document not found: {user_id}")))
    }

    /// Load a user's document by email, if one exists.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserDocument>> {
        Ok(self.store.find_by_email(email).await?.map(|v| v.document))
    }

    /// Create an empty document for a new user.
    pub async fn create_user(&self, user_id: UserId, email: &str) -> AppResult<UserDocument> {
        let document = UserDocument::new(user_id, email);
        self.store.insert(document.clone()).await?;
        Ok(document)
    }

    /// Atomically mutate one user's document.
    ///
    /// The closure must derive its effect from the document it is given:
    /// it may run several times, each time against freshly loaded state.
    /// Returning an error aborts the cycle without writing.
    pub async fn with_document<T, F>(&self, user_id: UserId, mut mutate: F) -> AppResult<T>
    where
        F: FnMut(&mut UserDocument) -> AppResult<T> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let versioned = self
                .store
                .load(user_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User document not found: {user_id}")))?;

            let mut document = versioned.document;
            let result = mutate(&mut document)?;

            if self.store.store_if(&document, versioned.version).await? {
                return Ok(result);
            }

            warn!(
                user_id = %user_id,
                attempt,
                "Document version conflict, retrying read-modify-write"
            );
        }

        Err(AppError::conflict(format!(
            "Gave up updating document for {user_id} after {MAX_CAS_ATTEMPTS} version conflicts"
        )))
    }

    /// Atomically mutate the owner's file list.
    pub async fn with_files<T, F>(&self, owner_id: UserId, mut mutate: F) -> AppResult<T>
    where
        F: FnMut(&mut Vec<FileRecord>) -> AppResult<T> + Send,
        T: Send,
    {
        self.with_document(owner_id, |doc| mutate(&mut doc.files))
            .await
    }

    /// Atomically mutate a recipient's shared view.
    pub async fn with_shared_view<T, F>(&self, user_id: UserId, mut mutate: F) -> AppResult<T>
    where
        F: FnMut(&mut Vec<SharedViewEntry>) -> AppResult<T> + Send,
        T: Send,
    {
        self.with_document(user_id, |doc| mutate(&mut doc.files_shared_with))
            .await
    }

    /// All users holding a shared-view entry for the given file.
    pub async fn shared_view_holders(&self, file_id: FileId) -> AppResult<Vec<UserId>> {
        self.store.shared_view_holders(file_id).await
    }
}
