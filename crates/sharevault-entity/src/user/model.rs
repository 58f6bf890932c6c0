//! Per-user document model.

use serde::{Deserialize, Serialize};

use sharevault_core::types::id::{FileId, UserId};

use crate::file::FileRecord;
use crate::shared_view::SharedViewEntry;

/// The per-user document held by the document store.
///
/// Each user owns exactly one document carrying both sides of sharing:
/// the authoritative `files` list and the denormalized `files_shared_with`
/// view. Cross-document transactions are not available; writers use
/// compare-and-swap on one document at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDocument {
    /// Stable user identifier from the identity provider.
    pub id: UserId,
    /// Verified email, unique across users.
    pub email: String,
    /// Files owned by this user.
    #[serde(default)]
    pub files: Vec<FileRecord>,
    /// Files other owners shared with this user.
    #[serde(default)]
    pub files_shared_with: Vec<SharedViewEntry>,
}

impl UserDocument {
    /// Create an empty document for a new user.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            files: Vec::new(),
            files_shared_with: Vec::new(),
        }
    }

    /// Find an owned file by id.
    pub fn file(&self, file_id: FileId) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == file_id)
    }

    /// Find an owned file by id, mutably.
    pub fn file_mut(&mut self, file_id: FileId) -> Option<&mut FileRecord> {
        self.files.iter_mut().find(|f| f.id == file_id)
    }

    /// Remove an owned file by id, returning it if present.
    pub fn remove_file(&mut self, file_id: FileId) -> Option<FileRecord> {
        let idx = self.files.iter().position(|f| f.id == file_id)?;
        Some(self.files.remove(idx))
    }

    /// Find a shared-view entry by file id.
    pub fn shared_entry(&self, file_id: FileId) -> Option<&SharedViewEntry> {
        self.files_shared_with.iter().find(|e| e.file_id == file_id)
    }

    /// Insert a shared-view entry, replacing any existing entry for the
    /// same file. Returns `true` if an entry was replaced.
    pub fn upsert_shared_entry(&mut self, entry: SharedViewEntry) -> bool {
        let before = self.files_shared_with.len();
        self.files_shared_with.retain(|e| e.file_id != entry.file_id);
        let replaced = self.files_shared_with.len() != before;
        self.files_shared_with.push(entry);
        replaced
    }

    /// Remove the shared-view entry for a file. Returns `true` if an entry
    /// was removed.
    pub fn remove_shared_entry(&mut self, file_id: FileId) -> bool {
        let before = self.files_shared_with.len();
        self.files_shared_with.retain(|e| e.file_id != file_id);
        self.files_shared_with.len() != before
    }

    /// Whether this document's email matches, case-insensitively.
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}
