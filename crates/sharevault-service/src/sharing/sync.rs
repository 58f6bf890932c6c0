//! Lazy synchronization of the recipient's shared view.
//!
//! The shared view is reconciled on every read instead of by a scheduler:
//! expired and orphaned entries are pruned, and each surviving entry gets
//! its effective role resolved against the policy engine and the owner's
//! authoritative grants. Concurrent passes for different recipients need
//! no coordination since each mutates only its own recipient's document.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;
use sharevault_core::types::id::FileId;
use sharevault_entity::grant::Grant;
use sharevault_entity::shared_view::SharedFileView;
use sharevault_entity::user::UserDocument;
use sharevault_policy::gateway::{PolicyGateway, RoleClaim};
use sharevault_store::GrantStore;

use crate::sharing::resolver::RoleResolver;

/// Reads a recipient's shared view, reconciling it in the process.
#[derive(Debug, Clone)]
pub struct SharedViewSync {
    /// Grant store over the per-user documents.
    grants: GrantStore,
    /// Policy engine gateway.
    policy: Arc<dyn PolicyGateway>,
}

impl SharedViewSync {
    /// Creates a new shared-view sync.
    pub fn new(grants: GrantStore, policy: Arc<dyn PolicyGateway>) -> Self {
        Self { grants, policy }
    }

    /// Returns the recipient's live shared files with effective roles.
    ///
    /// Entries whose grant has expired, or that no longer correspond to a
    /// live grant in the owner's record, are removed from the recipient's
    /// document. Pruning is best-effort: a failed write is logged and the
    /// dead entries are simply pruned again on the next read. Resolved
    /// roles are never written back.
    pub async fn read_shared_view(&self, recipient_email: &str) -> AppResult<Vec<SharedFileView>> {
        let recipient_email = recipient_email.to_lowercase();
        let recipient = self
            .grants
            .find_by_email(&recipient_email)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No user with email {recipient_email}"))
            })?;

        let claims = self.fetch_claims(&recipient_email).await;
        let owners = self.load_owners(&recipient).await?;
        let now = Utc::now();

        let mut views = Vec::with_capacity(recipient.files_shared_with.len());
        let mut dead: Vec<FileId> = Vec::new();

        for entry in recipient.files_shared_with {
            if entry.is_expired(now) {
                debug!(
                    file_id = %entry.file_id,
                    recipient_email = %recipient_email,
                    "Pruning expired shared-view entry"
                );
                dead.push(entry.file_id);
                continue;
            }

            let grants: Vec<Grant> = owners
                .get(&entry.owner_email.to_lowercase())
                .and_then(|doc| doc.file(entry.file_id))
                .map(|record| record.grants_for(&recipient_email).cloned().collect())
                .unwrap_or_default();

            let live = grants.iter().any(|g| !g.is_expired(now));
            if !live {
                // Owner revoked directly, or the owner or file is gone.
                debug!(
                    file_id = %entry.file_id,
                    recipient_email = %recipient_email,
                    "Pruning orphaned shared-view entry"
                );
                dead.push(entry.file_id);
                continue;
            }

            match RoleResolver::resolve(entry.file_id, &grants, &claims, now) {
                Some(role) => views.push(SharedFileView::new(entry, role)),
                None => dead.push(entry.file_id),
            }
        }

        if !dead.is_empty() {
            let result = self
                .grants
                .with_shared_view(recipient.id, |view| {
                    view.retain(|e| !dead.contains(&e.file_id));
                    Ok(())
                })
                .await;
            if let Err(e) = result {
                warn!(
                    recipient_email = %recipient_email,
                    pruned = dead.len(),
                    error = %e,
                    "Failed to prune dead shared-view entries; will retry on next read"
                );
            }
        }

        Ok(views)
    }

    /// Fetch the recipient's policy claims, degrading to none when the
    /// engine is unreachable so expiry-checked local grants still apply.
    async fn fetch_claims(&self, recipient_email: &str) -> Vec<RoleClaim> {
        match self.policy.list_role_claims(recipient_email).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!(
                    recipient_email = %recipient_email,
                    error = %e,
                    "Failed to fetch policy claims; resolving from local grants only"
                );
                Vec::new()
            }
        }
    }

    /// Load each distinct owner's document once, keyed by lowercased email.
    async fn load_owners(
        &self,
        recipient: &UserDocument,
    ) -> AppResult<HashMap<String, UserDocument>> {
        let mut owners = HashMap::new();
        for entry in &recipient.files_shared_with {
            let key = entry.owner_email.to_lowercase();
            if owners.contains_key(&key) {
                continue;
            }
            if let Some(doc) = self.grants.find_by_email(&key).await? {
                owners.insert(key, doc);
            }
        }
        Ok(owners)
    }
}
