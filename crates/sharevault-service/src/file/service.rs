//! File upload and listing service.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;
use validator::Validate;

use sharevault_core::error::AppError;
use sharevault_core::result::AppResult;
use sharevault_core::traits::blob::BlobStore;
use sharevault_core::types::id::FileId;
use sharevault_entity::file::FileRecord;
use sharevault_policy::gateway::PolicyGateway;
use sharevault_storage::keys;
use sharevault_store::GrantStore;

use crate::context::RequestContext;

/// Handles file uploads and the owner's file listing.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Grant store over the per-user documents.
    grants: GrantStore,
    /// Blob store holding file bytes.
    blobs: Arc<dyn BlobStore>,
    /// Policy engine gateway.
    policy: Arc<dyn PolicyGateway>,
}

/// Request for uploading a new file.
#[derive(Debug, Clone, Validate)]
pub struct UploadFileRequest {
    /// Display title.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Free-form description.
    #[validate(length(max = 2000))]
    pub description: String,
    /// MIME type of the content.
    #[validate(length(min = 1))]
    pub content_type: String,
    /// File content bytes.
    pub data: Bytes,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(grants: GrantStore, blobs: Arc<dyn BlobStore>, policy: Arc<dyn PolicyGateway>) -> Self {
        Self {
            grants,
            blobs,
            policy,
        }
    }

    /// Uploads a file for the current user.
    ///
    /// Blob bytes land first, then the record is appended to the owner's
    /// document, then the policy resource instance is registered. A policy
    /// failure after the local write surfaces `ExternalService` with the
    /// local record intact; re-registering the resource is idempotent, so
    /// a caller can retry the registration without re-uploading.
    pub async fn upload_file(
        &self,
        ctx: &RequestContext,
        req: UploadFileRequest,
    ) -> AppResult<FileRecord> {
        req.validate()
            .map_err(|e| AppError::validation(format!("Invalid upload request: {e}")))?;

        let key = keys::upload_key(ctx.user_id, &req.content_type);
        self.blobs
            .put(&key, req.data.clone(), &req.content_type)
            .await?;

        let record = FileRecord::new(
            FileId::new(),
            req.title,
            req.description,
            key,
            req.data.len() as u64,
            req.content_type,
            ctx.request_time,
        );

        self.grants
            .with_files(ctx.user_id, |files| {
                files.push(record.clone());
                Ok(())
            })
            .await?;

        self.policy.create_resource(record.id).await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %record.id,
            title = %record.title,
            size = record.size_bytes,
            "File uploaded"
        );

        Ok(record)
    }

    /// Lists the current user's own files.
    pub async fn list_files(&self, ctx: &RequestContext) -> AppResult<Vec<FileRecord>> {
        Ok(self.grants.load(ctx.user_id).await?.files)
    }

    /// Reads a file's content by its record.
    pub async fn read_content(&self, record: &FileRecord) -> AppResult<Bytes> {
        self.blobs.read(&record.locator).await
    }

    /// The publicly addressable URL for a record's content.
    pub fn content_url(&self, record: &FileRecord) -> String {
        self.blobs.object_url(&record.locator)
    }
}
