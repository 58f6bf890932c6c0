//! Shared test helpers for integration tests.

use std::sync::Arc;

use bytes::Bytes;

use sharevault_core::types::id::UserId;
use sharevault_entity::file::FileRecord;
use sharevault_policy::memory::MemoryPolicyGateway;
use sharevault_service::context::RequestContext;
use sharevault_service::file::{FileService, UploadFileRequest};
use sharevault_service::sharing::{SharedViewSync, SharingCoordinator};
use sharevault_storage::MemoryBlobStore;
use sharevault_store::memory::MemoryDocumentStore;
use sharevault_store::GrantStore;

/// Test application wired against the in-memory providers.
pub struct TestApp {
    /// Grant store for direct document inspection.
    pub grants: GrantStore,
    /// Blob store for direct object inspection.
    pub blobs: Arc<MemoryBlobStore>,
    /// Policy gateway with failure injection.
    pub policy: Arc<MemoryPolicyGateway>,
    /// File service under test.
    pub files: FileService,
    /// Sharing coordinator under test.
    pub sharing: SharingCoordinator,
    /// Shared view sync under test.
    pub sync: SharedViewSync,
}

impl TestApp {
    /// Create a fresh application over empty in-memory stores.
    pub fn new() -> Self {
        let grants = GrantStore::new(Arc::new(MemoryDocumentStore::new()));
        let blobs = Arc::new(MemoryBlobStore::new());
        let policy = Arc::new(MemoryPolicyGateway::new());

        let files = FileService::new(grants.clone(), blobs.clone(), policy.clone());
        let sharing = SharingCoordinator::new(grants.clone(), blobs.clone(), policy.clone());
        let sync = SharedViewSync::new(grants.clone(), policy.clone());

        Self {
            grants,
            blobs,
            policy,
            files,
            sharing,
            sync,
        }
    }

    /// Register a user and return a request context acting as them.
    pub async fn create_user(&self, email: &str) -> RequestContext {
        let user_id = UserId::new();
        self.grants
            .create_user(user_id, email)
            .await
            .expect("Failed to create user");
        RequestContext::new(user_id, email)
    }

    /// Upload a small text file as the given user.
    pub async fn upload(&self, ctx: &RequestContext, title: &str, body: &str) -> FileRecord {
        self.files
            .upload_file(
                ctx,
                UploadFileRequest {
                    title: title.to_string(),
                    description: String::new(),
                    content_type: "text/plain".to_string(),
                    data: Bytes::from(body.to_string()),
                },
            )
            .await
            .expect("Upload failed")
    }
}
