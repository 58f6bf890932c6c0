//! Request context carrying the authenticated user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharevault_core::types::id::UserId;

/// Context for the current authenticated request.
///
/// Extracted at the application boundary and passed into service methods
/// so that every operation knows *who* is acting and at what instant.
/// Grant expiries and upload timestamps derive from `request_time`, not
/// from repeated `Utc::now()` calls, so one request sees one clock value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The authenticated user's verified email.
    pub email: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context stamped with the current time.
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            request_time: Utc::now(),
        }
    }

    /// Creates a context with an explicit request time.
    pub fn at(user_id: UserId, email: impl Into<String>, request_time: DateTime<Utc>) -> Self {
        Self {
            user_id,
            email: email.into(),
            request_time,
        }
    }
}
