//! Grant lifecycle coordination across the owner's record, the recipient's
//! shared view, and the policy engine.
//!
//! There is no transaction spanning the three stores. Ordering plus
//! idempotent steps stand in for one: local intent is recorded before the
//! policy engine is told to enforce it, and every step converges when the
//! whole operation is re-run with the same arguments. No lock is held
//! across a policy-engine call.

use std::sync::Arc;

use tracing::{error, info, warn};
use validator::Validate;

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;
use sharevault_core::traits::blob::BlobStore;
use sharevault_core::types::id::FileId;
use sharevault_entity::file::FileRecord;
use sharevault_entity::grant::{Grant, GrantRole, ShareDuration};
use sharevault_entity::shared_view::SharedViewEntry;
use sharevault_policy::gateway::PolicyGateway;
use sharevault_storage::keys;
use sharevault_store::GrantStore;

use crate::context::RequestContext;

/// Coordinates multi-store grant operations.
#[derive(Debug, Clone)]
pub struct SharingCoordinator {
    /// Grant store over the per-user documents.
    grants: GrantStore,
    /// Blob store holding file bytes.
    blobs: Arc<dyn BlobStore>,
    /// Policy engine gateway.
    policy: Arc<dyn PolicyGateway>,
}

/// Request to share a file with a recipient.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Validate)]
pub struct CreateGrantRequest {
    /// The file to share.
    pub file_id: FileId,
    /// Recipient's email; must belong to an existing user.
    #[validate(email)]
    pub recipient_email: String,
    /// Role to grant.
    pub role: GrantRole,
    /// How long the grant lasts.
    pub duration: ShareDuration,
}

/// Request to update an owned file.
///
/// `content` of `None` is a metadata-only update and leaves the blob
/// untouched.
#[derive(Debug, Clone, Validate)]
pub struct UpdateFileRequest {
    /// New title, if changing.
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    /// New description, if changing.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Replacement content, if changing.
    pub content: Option<ReplacementContent>,
}

/// Replacement bytes for a content update.
#[derive(Debug, Clone)]
pub struct ReplacementContent {
    /// New content bytes.
    pub data: bytes::Bytes,
    /// MIME type of the new content.
    pub content_type: String,
}

impl SharingCoordinator {
    /// Creates a new sharing coordinator.
    pub fn new(grants: GrantStore, blobs: Arc<dyn BlobStore>, policy: Arc<dyn PolicyGateway>) -> Self {
        Self {
            grants,
            blobs,
            policy,
        }
    }

    /// Shares a file with a recipient.
    ///
    /// Order of effects: policy subject, owner's grant, recipient's view
    /// entry, policy role assignment. A failure before the first write
    /// leaves nothing behind; any failure after the owner's grant is written
    /// surfaces `PartialGrant` with the local intent already recorded, and
    /// re-running the same request converges without duplicating anything.
    pub async fn create_grant(
        &self,
        ctx: &RequestContext,
        req: CreateGrantRequest,
    ) -> AppResult<Grant> {
        req.validate()
            .map_err(|e| AppError::validation(format!("Invalid grant request: {e}")))?;

        if req.role.is_admin() && !req.duration.is_unlimited() {
            return Err(AppError::invalid_grant_policy(
                "Admin grants cannot carry a time bound; use the unlimited duration",
            ));
        }

        let recipient_email = req.recipient_email.to_lowercase();
        let recipient = self
            .grants
            .find_by_email(&recipient_email)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("No user with email {recipient_email}"))
            })?;

        // The file must exist before any external effect.
        let owner = self.grants.load(ctx.user_id).await?;
        if owner.file(req.file_id).is_none() {
            return Err(AppError::not_found(format!(
                "File not found: {}",
                req.file_id
            )));
        }

        let expiry = req.duration.expiry_from(ctx.request_time);
        let grant = Grant::new(recipient_email.clone(), req.role, expiry, ctx.request_time);

        // Step 1: the policy subject. Fails before anything is written.
        self.policy.ensure_subject(&recipient_email).await?;

        // Step 2: record the grant in the owner's file record, replacing
        // any previous grant for this recipient.
        let record = self
            .grants
            .with_files(ctx.user_id, |files| {
                let record = files
                    .iter_mut()
                    .find(|f| f.id == req.file_id)
                    .ok_or_else(|| {
                        AppError::not_found(format!("File not found: {}", req.file_id))
                    })?;
                record.upsert_grant(grant.clone());
                Ok(record.clone())
            })
            .await?;

        // Step 3: mirror into the recipient's shared view, one entry per
        // file. The owner's record already carries the grant, so from here
        // on any failure is a partial grant.
        let entry = SharedViewEntry::from_grant(&record, &ctx.email, &grant);
        if let Err(e) = self
            .grants
            .with_document(recipient.id, |doc| {
                doc.upsert_shared_entry(entry.clone());
                Ok(())
            })
            .await
        {
            error!(
                file_id = %req.file_id,
                recipient_email = %recipient_email,
                step = "shared_view",
                error = %e,
                "Grant recorded locally but the recipient's view write failed"
            );
            return Err(AppError::partial_grant(format!(
                "Grant for {recipient_email} on file {} was recorded but the shared \
                 view write failed; re-run the share to complete it",
                req.file_id
            )));
        }

        // Step 4: tell the engine to enforce it.
        if let Err(e) = self
            .policy
            .assign_role(&recipient_email, req.role, req.file_id)
            .await
        {
            error!(
                file_id = %req.file_id,
                recipient_email = %recipient_email,
                step = "assign_role",
                error = %e,
                "Grant recorded locally but policy assignment failed"
            );
            return Err(AppError::partial_grant(format!(
                "Grant for {recipient_email} on file {} was recorded but the policy \
                 assignment failed; re-run the share to complete it",
                req.file_id
            )));
        }

        info!(
            user_id = %ctx.user_id,
            file_id = %req.file_id,
            recipient_email = %recipient_email,
            role = %req.role,
            duration = %req.duration,
            "Grant created"
        );

        Ok(grant)
    }

    /// Revokes a recipient's grant on a file.
    ///
    /// Local removal is authoritative for intent: the grant and the view
    /// entry go first, then the policy assignment is unassigned best-effort.
    /// A policy-side failure is logged for manual audit, not surfaced.
    pub async fn revoke_grant(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        recipient_email: &str,
    ) -> AppResult<()> {
        let recipient_email = recipient_email.to_lowercase();

        let removed = self
            .grants
            .with_files(ctx.user_id, |files| {
                let record = files
                    .iter_mut()
                    .find(|f| f.id == file_id)
                    .ok_or_else(|| AppError::not_found(format!("File not found: {file_id}")))?;
                let grant = record
                    .grants_for(&recipient_email)
                    .next()
                    .cloned()
                    .ok_or_else(|| {
                        AppError::not_found(format!(
                            "No grant for {recipient_email} on file {file_id}"
                        ))
                    })?;
                record.remove_grants_for(&recipient_email);
                Ok(grant)
            })
            .await?;

        if let Some(recipient) = self.grants.find_by_email(&recipient_email).await? {
            self.grants
                .with_document(recipient.id, |doc| {
                    doc.remove_shared_entry(file_id);
                    Ok(())
                })
                .await?;
        }

        if let Err(e) = self
            .policy
            .unassign_role(&recipient_email, removed.role, file_id)
            .await
        {
            error!(
                file_id = %file_id,
                recipient_email = %recipient_email,
                error = %e,
                "Grant revoked locally but policy unassignment failed; needs manual audit"
            );
        }

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            recipient_email = %recipient_email,
            "Grant revoked"
        );

        Ok(())
    }

    /// Deletes an owned file and every trace of its sharing.
    ///
    /// Blob, owner's record, every recipient's view entry, and the policy
    /// resource scope all go. Each step tolerates "already absent", so a
    /// run interrupted part-way can simply be repeated.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<()> {
        let owner = self.grants.load(ctx.user_id).await?;

        if let Some(record) = owner.file(file_id) {
            self.blobs.delete(&record.locator).await?;
            self.grants
                .with_document(ctx.user_id, |doc| {
                    doc.remove_file(file_id);
                    Ok(())
                })
                .await?;
        }

        for holder in self.grants.shared_view_holders(file_id).await? {
            self.grants
                .with_shared_view(holder, |view| {
                    view.retain(|e| e.file_id != file_id);
                    Ok(())
                })
                .await?;
        }

        self.policy.delete_resource(file_id).await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            "File deleted"
        );

        Ok(())
    }

    /// Updates an owned file's metadata and optionally its content.
    ///
    /// On content replacement the new blob is written before the record
    /// switches over and only then is the old blob deleted, so the record
    /// never points at bytes that are gone. Changes are pushed to every
    /// recipient's view entry, which is a snapshot, not a live join.
    pub async fn update_file(
        &self,
        ctx: &RequestContext,
        file_id: FileId,
        req: UpdateFileRequest,
    ) -> AppResult<FileRecord> {
        req.validate()
            .map_err(|e| AppError::validation(format!("Invalid update request: {e}")))?;

        let owner = self.grants.load(ctx.user_id).await?;
        let old_locator = owner
            .file(file_id)
            .map(|r| r.locator.clone())
            .ok_or_else(|| AppError::not_found(format!("File not found: {file_id}")))?;

        let new_blob = match &req.content {
            Some(content) => {
                let key = keys::upload_key(ctx.user_id, &content.content_type);
                self.blobs
                    .put(&key, content.data.clone(), &content.content_type)
                    .await?;
                Some(key)
            }
            None => None,
        };

        let updated = self
            .grants
            .with_files(ctx.user_id, |files| {
                let record = files
                    .iter_mut()
                    .find(|f| f.id == file_id)
                    .ok_or_else(|| AppError::not_found(format!("File not found: {file_id}")))?;
                if let Some(title) = &req.title {
                    record.title = title.clone();
                }
                if let Some(description) = &req.description {
                    record.description = description.clone();
                }
                if let (Some(content), Some(key)) = (&req.content, &new_blob) {
                    record.locator = key.clone();
                    record.size_bytes = content.data.len() as u64;
                    record.content_type = content.content_type.clone();
                    record.uploaded_at = ctx.request_time;
                }
                Ok(record.clone())
            })
            .await?;

        // The old bytes are unreachable now; a failed cleanup only leaks
        // a blob, so it does not fail the update.
        if new_blob.is_some() {
            if let Err(e) = self.blobs.delete(&old_locator).await {
                warn!(
                    file_id = %file_id,
                    locator = %old_locator,
                    error = %e,
                    "Failed to delete replaced blob"
                );
            }
        }

        for holder in self.grants.shared_view_holders(file_id).await? {
            self.grants
                .with_shared_view(holder, |view| {
                    if let Some(entry) = view.iter_mut().find(|e| e.file_id == file_id) {
                        entry.refresh_metadata(&updated);
                    }
                    Ok(())
                })
                .await?;
        }

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            content_replaced = new_blob.is_some(),
            "File updated"
        );

        Ok(updated)
    }
}
