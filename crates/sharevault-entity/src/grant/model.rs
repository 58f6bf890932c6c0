//! Grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::expiry::GrantExpiry;
use super::role::GrantRole;

/// A recorded authorization from an owner to a recipient for one file.
///
/// Grants are embedded in the owning [`FileRecord`](crate::FileRecord) in
/// sharing order. An expired grant is deleted, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    /// Email of the recipient; must resolve to an existing user document.
    pub recipient_email: String,
    /// Role granted.
    pub role: GrantRole,
    /// Time bound on the grant.
    pub expiry: GrantExpiry,
    /// When the grant was recorded.
    pub granted_at: DateTime<Utc>,
}

impl Grant {
    /// Create a new grant recorded at `now`.
    pub fn new(
        recipient_email: impl Into<String>,
        role: GrantRole,
        expiry: GrantExpiry,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            role,
            expiry,
            granted_at: now,
        }
    }

    /// Whether the grant is expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_expired(now)
    }

    /// Whether this grant belongs to the given recipient (emails are
    /// compared case-insensitively).
    pub fn is_for(&self, recipient_email: &str) -> bool {
        self.recipient_email.eq_ignore_ascii_case(recipient_email)
    }
}
