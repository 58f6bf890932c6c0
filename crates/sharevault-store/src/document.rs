//! Document store trait: versioned per-user documents.
//!
//! The store offers no cross-document transactions. Atomicity is per
//! document: `store_if` succeeds only when the document's version is still
//! the one the caller read, so concurrent read-modify-write cycles on the
//! same user serialize instead of losing updates.

use async_trait::async_trait;

use sharevault_core::result::AppResult;
use sharevault_core::types::id::{FileId, UserId};
use sharevault_entity::user::UserDocument;

/// A user document together with the version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedDocument {
    /// The document contents.
    pub document: UserDocument,
    /// Monotonic per-document version counter.
    pub version: i64,
}

/// Trait for per-user document storage backends.
///
/// Implemented by [`PostgresDocumentStore`](crate::PostgresDocumentStore)
/// and [`MemoryDocumentStore`](crate::MemoryDocumentStore).
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load a user's document by id.
    async fn load(&self, user_id: UserId) -> AppResult<Option<VersionedDocument>>;

    /// Load a user's document by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<VersionedDocument>>;

    /// Insert a brand-new user document at version 0.
    ///
    /// Fails with `Conflict` if a document already exists for the user.
    async fn insert(&self, document: UserDocument) -> AppResult<()>;

    /// Conditionally replace a document.
    ///
    /// Writes only if the stored version still equals `expected_version`,
    /// bumping the version on success. Returns `false` when the condition
    /// failed (someone else wrote in between); the caller re-reads and
    /// retries.
    async fn store_if(&self, document: &UserDocument, expected_version: i64) -> AppResult<bool>;

    /// All users whose `files_shared_with` references the given file.
    ///
    /// Full scan by design; see DESIGN.md for the reverse-index scaling
    /// note.
    async fn shared_view_holders(&self, file_id: FileId) -> AppResult<Vec<UserId>>;
}
