//! File record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharevault_core::types::id::FileId;

use crate::grant::Grant;

/// A file owned by exactly one user, stored in that user's document.
///
/// The `grants` list is the system of record for sharing *intent*; the
/// policy engine holds the enforcement-side copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque unique identifier, generated at upload, immutable.
    pub id: FileId,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Blob-store key for the file bytes; mutable only on content
    /// replacement.
    pub locator: String,
    /// Size of the content in bytes.
    pub size_bytes: u64,
    /// MIME type of the content.
    pub content_type: String,
    /// When the content was uploaded; refreshed on content replacement.
    pub uploaded_at: DateTime<Utc>,
    /// Grants for this file, in sharing order.
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl FileRecord {
    /// Create a new record for freshly uploaded content.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FileId,
        title: impl Into<String>,
        description: impl Into<String>,
        locator: impl Into<String>,
        size_bytes: u64,
        content_type: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            locator: locator.into(),
            size_bytes,
            content_type: content_type.into(),
            uploaded_at: now,
            grants: Vec::new(),
        }
    }

    /// All grants held by the given recipient, in sharing order.
    ///
    /// Documents written before re-shares replaced existing grants may hold
    /// duplicates for one recipient; callers tie-break via the resolver.
    pub fn grants_for<'a>(&'a self, recipient_email: &'a str) -> impl Iterator<Item = &'a Grant> {
        self.grants.iter().filter(move |g| g.is_for(recipient_email))
    }

    /// Insert a grant, replacing any existing grants for the same
    /// recipient. Returns `true` if an existing grant was replaced.
    pub fn upsert_grant(&mut self, grant: Grant) -> bool {
        let before = self.grants.len();
        self.grants.retain(|g| !g.is_for(&grant.recipient_email));
        let replaced = self.grants.len() != before;
        self.grants.push(grant);
        replaced
    }

    /// Remove all grants for the given recipient. Returns `true` if any
    /// grant was removed.
    pub fn remove_grants_for(&mut self, recipient_email: &str) -> bool {
        let before = self.grants.len();
        self.grants.retain(|g| !g.is_for(recipient_email));
        self.grants.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::{GrantExpiry, GrantRole};

    fn record() -> FileRecord {
        FileRecord::new(
            FileId::new(),
            "report",
            "quarterly report",
            "uploads/u/abc.pdf",
            1024,
            "application/pdf",
            Utc::now(),
        )
    }

    #[test]
    fn test_upsert_replaces_existing_grant() {
        let mut rec = record();
        let now = Utc::now();
        rec.upsert_grant(Grant::new("r@x.com", GrantRole::Viewer, GrantExpiry::Unlimited, now));
        let replaced =
            rec.upsert_grant(Grant::new("R@X.COM", GrantRole::Editor, GrantExpiry::Unlimited, now));

        assert!(replaced);
        assert_eq!(rec.grants.len(), 1);
        assert_eq!(rec.grants[0].role, GrantRole::Editor);
    }

    #[test]
    fn test_remove_grants_for() {
        let mut rec = record();
        let now = Utc::now();
        rec.upsert_grant(Grant::new("a@x.com", GrantRole::Viewer, GrantExpiry::Unlimited, now));
        rec.upsert_grant(Grant::new("b@x.com", GrantRole::Editor, GrantExpiry::Unlimited, now));

        assert!(rec.remove_grants_for("a@x.com"));
        assert!(!rec.remove_grants_for("a@x.com"));
        assert_eq!(rec.grants.len(), 1);
        assert!(rec.grants[0].is_for("b@x.com"));
    }
}
