//! Policy gateway trait and claim types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sharevault_core::result::AppResult;
use sharevault_core::types::id::FileId;
use sharevault_entity::grant::GrantRole;

/// One role the policy engine currently holds for a subject on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleClaim {
    /// The file the claim applies to.
    pub file_id: FileId,
    /// The claimed role.
    pub role: GrantRole,
}

/// Trait for policy engine backends.
///
/// Every operation is idempotent: ensuring an existing subject, assigning
/// an assignment that already exists, or deleting something already absent
/// all succeed, so callers can retry any step of a multi-store write
/// without checking what the previous attempt reached.
#[async_trait]
pub trait PolicyGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Make sure a subject exists for the given email (get-or-create).
    async fn ensure_subject(&self, email: &str) -> AppResult<()>;

    /// Assign a role to the subject on a file's resource instance.
    async fn assign_role(&self, email: &str, role: GrantRole, file_id: FileId) -> AppResult<()>;

    /// Remove a role assignment. Removing an absent assignment succeeds.
    async fn unassign_role(&self, email: &str, role: GrantRole, file_id: FileId) -> AppResult<()>;

    /// All role claims the subject holds, in one batched call.
    ///
    /// Claims with roles outside the grant vocabulary or malformed
    /// resource identifiers are filtered out by the implementation.
    async fn list_role_claims(&self, email: &str) -> AppResult<Vec<RoleClaim>>;

    /// Register a file's resource instance. Creating an instance that
    /// already exists succeeds.
    async fn create_resource(&self, file_id: FileId) -> AppResult<()>;

    /// Delete a file's resource instance and every assignment scoped to
    /// it. Deleting an absent instance succeeds.
    async fn delete_resource(&self, file_id: FileId) -> AppResult<()>;
}

/// Format the subject key for an email (`user|{email}`, lowercased).
pub fn subject_key(email: &str) -> String {
    format!("user|{}", email.to_lowercase())
}

/// Format a resource instance identifier (`{resource_type}:{file_id}`).
pub fn resource_instance(resource_type: &str, file_id: FileId) -> String {
    format!("{resource_type}:{file_id}")
}
