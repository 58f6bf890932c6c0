//! Shared view entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharevault_core::types::id::FileId;

use crate::file::FileRecord;
use crate::grant::{Grant, GrantExpiry, GrantRole};

/// A recipient-owned denormalized copy of a shared file's metadata plus
/// grant terms.
///
/// Every entry must correspond to exactly one live grant in some
/// [`FileRecord`]; entries without one are garbage and get pruned on the
/// next read of the view. `granted_role` is the role snapshot taken at
/// share time; it is only a degraded-mode fallback, never the effective
/// role, which is resolved on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedViewEntry {
    /// Identifier of the shared file.
    pub file_id: FileId,
    /// Title snapshot.
    pub title: String,
    /// Description snapshot.
    pub description: String,
    /// Blob locator snapshot.
    pub locator: String,
    /// MIME type snapshot.
    pub content_type: String,
    /// Size snapshot in bytes.
    pub size_bytes: u64,
    /// Upload timestamp snapshot.
    pub uploaded_at: DateTime<Utc>,
    /// Email of the file's owner.
    pub owner_email: String,
    /// Role snapshot taken when the grant was created.
    pub granted_role: GrantRole,
    /// Time bound copied from the grant.
    pub expiry: GrantExpiry,
}

impl SharedViewEntry {
    /// Snapshot a file record and grant into a view entry for the
    /// recipient.
    pub fn from_grant(record: &FileRecord, owner_email: &str, grant: &Grant) -> Self {
        Self {
            file_id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            locator: record.locator.clone(),
            content_type: record.content_type.clone(),
            size_bytes: record.size_bytes,
            uploaded_at: record.uploaded_at,
            owner_email: owner_email.to_string(),
            granted_role: grant.role,
            expiry: grant.expiry,
        }
    }

    /// Whether the underlying grant is expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_expired(now)
    }

    /// Re-copy the denormalized metadata fields from the owner's record.
    ///
    /// Used when the owner edits a file: the view is a snapshot, not a
    /// live join, so changes must be pushed to every holder.
    pub fn refresh_metadata(&mut self, record: &FileRecord) {
        self.title = record.title.clone();
        self.description = record.description.clone();
        self.locator = record.locator.clone();
        self.content_type = record.content_type.clone();
        self.size_bytes = record.size_bytes;
        self.uploaded_at = record.uploaded_at;
    }
}

/// A shared view entry with its effective role resolved at read time.
///
/// This is the in-memory result of a shared-view read; the effective role
/// is recomputed on every read and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedFileView {
    /// The stored entry.
    #[serde(flatten)]
    pub entry: SharedViewEntry,
    /// The role actually in effect for the recipient on this file.
    pub effective_role: GrantRole,
}

impl SharedFileView {
    /// Attach a resolved role to an entry.
    pub fn new(entry: SharedViewEntry, effective_role: GrantRole) -> Self {
        Self {
            entry,
            effective_role,
        }
    }
}
