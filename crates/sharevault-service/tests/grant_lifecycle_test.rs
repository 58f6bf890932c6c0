//! Integration tests for the grant lifecycle: create, re-create, partial
//! failure recovery, and revocation.

mod helpers;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use sharevault_core::error::ErrorKind;
use sharevault_core::result::AppResult;
use sharevault_core::types::id::{FileId, UserId};
use sharevault_entity::grant::{GrantRole, ShareDuration};
use sharevault_entity::user::UserDocument;
use sharevault_policy::memory::MemoryPolicyGateway;
use sharevault_service::context::RequestContext;
use sharevault_service::file::{FileService, UploadFileRequest};
use sharevault_service::sharing::{CreateGrantRequest, SharingCoordinator};
use sharevault_storage::MemoryBlobStore;
use sharevault_store::{DocumentStore, GrantStore, MemoryDocumentStore, VersionedDocument};

fn share_request(
    file_id: sharevault_core::types::id::FileId,
    recipient_email: &str,
    role: GrantRole,
    duration: ShareDuration,
) -> CreateGrantRequest {
    CreateGrantRequest {
        file_id,
        recipient_email: recipient_email.to_string(),
        role,
        duration,
    }
}

#[tokio::test]
async fn test_create_grant_records_all_three_views() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    app.sharing
        .create_grant(
            &owner,
            share_request(file.id, "recipient@x.com", GrantRole::Viewer, ShareDuration::SevenDays),
        )
        .await
        .expect("Share failed");

    // Owner's record carries the grant.
    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    let grants: Vec<_> = owner_doc
        .file(file.id)
        .unwrap()
        .grants_for("recipient@x.com")
        .collect();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role, GrantRole::Viewer);

    // Recipient's view mirrors it.
    let recipient_doc = app.grants.load(recipient.user_id).await.unwrap();
    let entry = recipient_doc.shared_entry(file.id).expect("No view entry");
    assert_eq!(entry.owner_email, "owner@x.com");
    assert_eq!(entry.title, "report");

    // Policy engine enforces it.
    assert_eq!(
        app.policy.assignment("recipient@x.com", file.id),
        Some(GrantRole::Viewer)
    );
}

#[tokio::test]
async fn test_recreate_converges_without_duplicates() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    let req = share_request(
        file.id,
        "recipient@x.com",
        GrantRole::Editor,
        ShareDuration::Unlimited,
    );
    app.sharing.create_grant(&owner, req.clone()).await.unwrap();
    app.sharing.create_grant(&owner, req).await.unwrap();

    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    assert_eq!(owner_doc.file(file.id).unwrap().grants.len(), 1);

    let recipient_doc = app.grants.load(recipient.user_id).await.unwrap();
    assert_eq!(recipient_doc.files_shared_with.len(), 1);
}

#[tokio::test]
async fn test_reshare_replaces_previous_grant() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let _recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    app.sharing
        .create_grant(
            &owner,
            share_request(file.id, "recipient@x.com", GrantRole::Viewer, ShareDuration::SevenDays),
        )
        .await
        .unwrap();
    app.sharing
        .create_grant(
            &owner,
            share_request(file.id, "recipient@x.com", GrantRole::Editor, ShareDuration::Unlimited),
        )
        .await
        .unwrap();

    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    let record = owner_doc.file(file.id).unwrap();
    assert_eq!(record.grants.len(), 1);
    assert_eq!(record.grants[0].role, GrantRole::Editor);
    assert_eq!(
        app.policy.assignment("recipient@x.com", file.id),
        Some(GrantRole::Editor)
    );
}

#[tokio::test]
async fn test_admin_grant_with_finite_duration_rejected_with_no_writes() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    let err = app
        .sharing
        .create_grant(
            &owner,
            share_request(file.id, "recipient@x.com", GrantRole::Admin, ShareDuration::SevenDays),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidGrantPolicy);

    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    assert!(owner_doc.file(file.id).unwrap().grants.is_empty());
    let recipient_doc = app.grants.load(recipient.user_id).await.unwrap();
    assert!(recipient_doc.files_shared_with.is_empty());
    assert!(app.policy.assignment("recipient@x.com", file.id).is_none());
}

#[tokio::test]
async fn test_unknown_recipient_is_not_found() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    let err = app
        .sharing
        .create_grant(
            &owner,
            share_request(file.id, "nobody@x.com", GrantRole::Viewer, ShareDuration::SevenDays),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_partial_failure_then_retry_converges() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    app.policy.fail_next_assignments(1);
    let req = share_request(
        file.id,
        "recipient@x.com",
        GrantRole::Viewer,
        ShareDuration::TwoWeeks,
    );
    let err = app
        .sharing
        .create_grant(&owner, req.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PartialGrant);

    // Local intent survived the failed final step.
    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    assert_eq!(owner_doc.file(file.id).unwrap().grants.len(), 1);
    let recipient_doc = app.grants.load(recipient.user_id).await.unwrap();
    assert_eq!(recipient_doc.files_shared_with.len(), 1);
    assert!(app.policy.assignment("recipient@x.com", file.id).is_none());

    // Retrying completes the assignment without duplicating the rest.
    app.sharing.create_grant(&owner, req).await.unwrap();
    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    assert_eq!(owner_doc.file(file.id).unwrap().grants.len(), 1);
    let recipient_doc = app.grants.load(recipient.user_id).await.unwrap();
    assert_eq!(recipient_doc.files_shared_with.len(), 1);
    assert_eq!(
        app.policy.assignment("recipient@x.com", file.id),
        Some(GrantRole::Viewer)
    );
}

/// Delegates to the in-memory store but reports a version conflict on
/// every write to one marked document, like a contending writer that
/// never yields.
#[derive(Debug, Default)]
struct ContendedDocumentStore {
    inner: MemoryDocumentStore,
    contended: Mutex<Option<UserId>>,
}

impl ContendedDocumentStore {
    fn contend_on(&self, user_id: UserId) {
        *self.contended.lock().unwrap() = Some(user_id);
    }

    fn release(&self) {
        *self.contended.lock().unwrap() = None;
    }
}

#[async_trait]
impl DocumentStore for ContendedDocumentStore {
    async fn load(&self, user_id: UserId) -> AppResult<Option<VersionedDocument>> {
        self.inner.load(user_id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<VersionedDocument>> {
        self.inner.find_by_email(email).await
    }

    async fn insert(&self, document: UserDocument) -> AppResult<()> {
        self.inner.insert(document).await
    }

    async fn store_if(&self, document: &UserDocument, expected_version: i64) -> AppResult<bool> {
        if *self.contended.lock().unwrap() == Some(document.id) {
            return Ok(false);
        }
        self.inner.store_if(document, expected_version).await
    }

    async fn shared_view_holders(&self, file_id: FileId) -> AppResult<Vec<UserId>> {
        self.inner.shared_view_holders(file_id).await
    }
}

#[tokio::test]
async fn test_recipient_view_contention_surfaces_partial_grant() {
    let store = Arc::new(ContendedDocumentStore::default());
    let grants = GrantStore::new(store.clone());
    let blobs = Arc::new(MemoryBlobStore::new());
    let policy = Arc::new(MemoryPolicyGateway::new());
    let files = FileService::new(grants.clone(), blobs.clone(), policy.clone());
    let sharing = SharingCoordinator::new(grants.clone(), blobs, policy.clone());

    let owner_id = UserId::new();
    grants.create_user(owner_id, "owner@x.com").await.unwrap();
    let recipient_id = UserId::new();
    grants
        .create_user(recipient_id, "recipient@x.com")
        .await
        .unwrap();

    let owner = RequestContext::new(owner_id, "owner@x.com");
    let file = files
        .upload_file(
            &owner,
            UploadFileRequest {
                title: "report".to_string(),
                description: String::new(),
                content_type: "text/plain".to_string(),
                data: Bytes::from("contents"),
            },
        )
        .await
        .unwrap();

    store.contend_on(recipient_id);
    let req = share_request(
        file.id,
        "recipient@x.com",
        GrantRole::Viewer,
        ShareDuration::Unlimited,
    );
    let err = sharing.create_grant(&owner, req.clone()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::PartialGrant);

    // The owner's grant landed before the view write stalled.
    let owner_doc = grants.load(owner_id).await.unwrap();
    assert_eq!(owner_doc.file(file.id).unwrap().grants.len(), 1);
    let recipient_doc = grants.load(recipient_id).await.unwrap();
    assert!(recipient_doc.files_shared_with.is_empty());

    // Once the contention clears, the same request completes the grant.
    store.release();
    sharing.create_grant(&owner, req).await.unwrap();
    let recipient_doc = grants.load(recipient_id).await.unwrap();
    assert_eq!(recipient_doc.files_shared_with.len(), 1);
    assert_eq!(
        policy.assignment("recipient@x.com", file.id),
        Some(GrantRole::Viewer)
    );
}

#[tokio::test]
async fn test_revoke_removes_grant_view_and_assignment() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    app.sharing
        .create_grant(
            &owner,
            share_request(file.id, "recipient@x.com", GrantRole::Editor, ShareDuration::Unlimited),
        )
        .await
        .unwrap();

    app.sharing
        .revoke_grant(&owner, file.id, "recipient@x.com")
        .await
        .unwrap();

    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    assert!(owner_doc.file(file.id).unwrap().grants.is_empty());
    let recipient_doc = app.grants.load(recipient.user_id).await.unwrap();
    assert!(recipient_doc.files_shared_with.is_empty());
    assert!(app.policy.assignment("recipient@x.com", file.id).is_none());
}

#[tokio::test]
async fn test_revoke_then_read_yields_nothing_despite_stale_claim() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let _recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    app.sharing
        .create_grant(
            &owner,
            share_request(file.id, "recipient@x.com", GrantRole::Viewer, ShareDuration::Unlimited),
        )
        .await
        .unwrap();
    app.sharing
        .revoke_grant(&owner, file.id, "recipient@x.com")
        .await
        .unwrap();

    // Simulate the policy engine still holding the assignment (the
    // best-effort unassign was lost).
    app.policy
        .set_assignment("recipient@x.com", file.id, GrantRole::Viewer);

    let view = app.sync.read_shared_view("recipient@x.com").await.unwrap();
    assert!(view.is_empty());
}

#[tokio::test]
async fn test_revoking_absent_grant_is_not_found() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let _recipient = app.create_user("recipient@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    let err = app
        .sharing
        .revoke_grant(&owner, file.id, "recipient@x.com")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
