//! In-memory policy gateway, used by tests and single-node development.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use async_trait::async_trait;

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;
use sharevault_core::types::id::FileId;
use sharevault_entity::grant::GrantRole;

use crate::gateway::{PolicyGateway, RoleClaim};

/// In-memory [`PolicyGateway`] with the same idempotency semantics as the
/// HTTP gateway.
///
/// Also supports injecting assignment and resource-creation failures,
/// which the service-level tests use to exercise partial-grant and
/// interrupted-upload handling.
#[derive(Debug, Default)]
pub struct MemoryPolicyGateway {
    subjects: DashSet<String>,
    resources: DashSet<Uuid>,
    assignments: DashMap<(String, Uuid), GrantRole>,
    assign_failures: AtomicU32,
    resource_failures: AtomicU32,
}

impl MemoryPolicyGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `assign_role` fail.
    pub fn fail_next_assignments(&self, count: u32) {
        self.assign_failures.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` calls to `create_resource` fail.
    pub fn fail_next_resource_creations(&self, count: u32) {
        self.resource_failures.store(count, Ordering::SeqCst);
    }

    fn consume_failure(counter: &AtomicU32) -> bool {
        let remaining = counter.load(Ordering::SeqCst);
        remaining > 0
            && counter
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
    }

    /// The role currently assigned to a subject on a file, if any.
    pub fn assignment(&self, email: &str, file_id: FileId) -> Option<GrantRole> {
        self.assignments
            .get(&(email.to_lowercase(), file_id.into_uuid()))
            .map(|role| *role)
    }

    /// Overwrite an assignment directly, bypassing subject checks.
    ///
    /// Lets tests model the engine drifting from local state (roles
    /// adjusted by another service).
    pub fn set_assignment(&self, email: &str, file_id: FileId, role: GrantRole) {
        self.assignments
            .insert((email.to_lowercase(), file_id.into_uuid()), role);
    }

    /// Whether a subject exists.
    pub fn has_subject(&self, email: &str) -> bool {
        self.subjects.contains(&email.to_lowercase())
    }

    /// Whether a file's resource instance exists.
    pub fn has_resource(&self, file_id: FileId) -> bool {
        self.resources.contains(file_id.as_uuid())
    }
}

#[async_trait]
impl PolicyGateway for MemoryPolicyGateway {
    async fn ensure_subject(&self, email: &str) -> AppResult<()> {
        self.subjects.insert(email.to_lowercase());
        Ok(())
    }

    async fn assign_role(&self, email: &str, role: GrantRole, file_id: FileId) -> AppResult<()> {
        if Self::consume_failure(&self.assign_failures) {
            return Err(AppError::external_service(
                "Injected role assignment failure",
            ));
        }

        if !self.has_subject(email) {
            return Err(AppError::external_service(format!(
                "Unknown policy subject: {email}"
            )));
        }

        self.assignments
            .insert((email.to_lowercase(), file_id.into_uuid()), role);
        Ok(())
    }

    async fn unassign_role(&self, email: &str, _role: GrantRole, file_id: FileId) -> AppResult<()> {
        self.assignments
            .remove(&(email.to_lowercase(), file_id.into_uuid()));
        Ok(())
    }

    async fn list_role_claims(&self, email: &str) -> AppResult<Vec<RoleClaim>> {
        let email = email.to_lowercase();
        Ok(self
            .assignments
            .iter()
            .filter(|entry| entry.key().0 == email)
            .map(|entry| RoleClaim {
                file_id: FileId::from_uuid(entry.key().1),
                role: *entry.value(),
            })
            .collect())
    }

    async fn create_resource(&self, file_id: FileId) -> AppResult<()> {
        if Self::consume_failure(&self.resource_failures) {
            return Err(AppError::external_service(
                "Injected resource creation failure",
            ));
        }

        self.resources.insert(file_id.into_uuid());
        Ok(())
    }

    async fn delete_resource(&self, file_id: FileId) -> AppResult<()> {
        self.resources.remove(file_id.as_uuid());
        self.assignments
            .retain(|(_, file), _| *file != file_id.into_uuid());
        Ok(())
    }
}
