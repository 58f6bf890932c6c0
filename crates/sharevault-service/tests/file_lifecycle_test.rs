//! Integration tests for upload, listing, update propagation, and the
//! delete cascade.

mod helpers;

use bytes::Bytes;

use sharevault_entity::grant::{GrantRole, ShareDuration};
use sharevault_policy::gateway::PolicyGateway;
use sharevault_service::sharing::{CreateGrantRequest, UpdateFileRequest};
use sharevault_service::sharing::coordinator::ReplacementContent;

fn share(file_id: sharevault_core::types::id::FileId, email: &str) -> CreateGrantRequest {
    CreateGrantRequest {
        file_id,
        recipient_email: email.to_string(),
        role: GrantRole::Viewer,
        duration: ShareDuration::Unlimited,
    }
}

#[tokio::test]
async fn test_upload_and_list() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;

    let record = app.upload(&owner, "report", "contents").await;
    assert!(record.locator.starts_with(&format!("uploads/{}/", owner.user_id)));
    assert_eq!(record.size_bytes, "contents".len() as u64);
    assert!(app.blobs.contains(&record.locator));
    assert!(app.policy.has_resource(record.id));

    let files = app.files.list_files(&owner).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, record.id);

    let body = app.files.read_content(&record).await.unwrap();
    assert_eq!(body, Bytes::from("contents"));
}

#[tokio::test]
async fn test_upload_rejects_empty_title() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;

    let err = app
        .files
        .upload_file(
            &owner,
            sharevault_service::file::UploadFileRequest {
                title: String::new(),
                description: String::new(),
                content_type: "text/plain".to_string(),
                data: Bytes::from("x"),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, sharevault_core::error::ErrorKind::Validation);
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn test_upload_survives_failed_resource_registration() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;

    app.policy.fail_next_resource_creations(1);
    let err = app
        .files
        .upload_file(
            &owner,
            sharevault_service::file::UploadFileRequest {
                title: "report".to_string(),
                description: String::new(),
                content_type: "text/plain".to_string(),
                data: Bytes::from("contents"),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, sharevault_core::error::ErrorKind::ExternalService);

    // Blob and record are already in place; only the policy registration
    // is missing.
    let files = app.files.list_files(&owner).await.unwrap();
    assert_eq!(files.len(), 1);
    assert!(app.blobs.contains(&files[0].locator));
    assert!(!app.policy.has_resource(files[0].id));

    // Registering the resource again needs no re-upload.
    app.policy.create_resource(files[0].id).await.unwrap();
    assert!(app.policy.has_resource(files[0].id));
}

#[tokio::test]
async fn test_delete_cascades_to_every_view() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let alice = app.create_user("alice@x.com").await;
    let bob = app.create_user("bob@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    app.sharing
        .create_grant(&owner, share(file.id, "alice@x.com"))
        .await
        .unwrap();
    app.sharing
        .create_grant(&owner, share(file.id, "bob@x.com"))
        .await
        .unwrap();

    app.sharing.delete_file(&owner, file.id).await.unwrap();

    assert!(app.blobs.is_empty());
    let owner_doc = app.grants.load(owner.user_id).await.unwrap();
    assert!(owner_doc.files.is_empty());
    for recipient in [&alice, &bob] {
        let doc = app.grants.load(recipient.user_id).await.unwrap();
        assert!(doc.files_shared_with.is_empty());
    }
    assert!(!app.policy.has_resource(file.id));
    assert!(app.policy.assignment("alice@x.com", file.id).is_none());

    // Deleting again converges to the same state.
    app.sharing.delete_file(&owner, file.id).await.unwrap();
}

#[tokio::test]
async fn test_metadata_update_propagates_to_recipients() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let alice = app.create_user("alice@x.com").await;
    let file = app.upload(&owner, "report", "contents").await;

    app.sharing
        .create_grant(&owner, share(file.id, "alice@x.com"))
        .await
        .unwrap();

    let updated = app
        .sharing
        .update_file(
            &owner,
            file.id,
            UpdateFileRequest {
                title: Some("final report".to_string()),
                description: Some("reviewed".to_string()),
                content: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "final report");
    // Metadata-only update leaves the blob untouched.
    assert_eq!(updated.locator, file.locator);
    assert!(app.blobs.contains(&file.locator));

    let doc = app.grants.load(alice.user_id).await.unwrap();
    let entry = doc.shared_entry(file.id).unwrap();
    assert_eq!(entry.title, "final report");
    assert_eq!(entry.description, "reviewed");
}

#[tokio::test]
async fn test_content_replacement_swaps_blob_and_propagates() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;
    let alice = app.create_user("alice@x.com").await;
    let file = app.upload(&owner, "report", "v1").await;

    app.sharing
        .create_grant(&owner, share(file.id, "alice@x.com"))
        .await
        .unwrap();

    let later = sharevault_service::context::RequestContext::at(
        owner.user_id,
        "owner@x.com",
        owner.request_time + chrono::Duration::minutes(5),
    );
    let updated = app
        .sharing
        .update_file(
            &later,
            file.id,
            UpdateFileRequest {
                title: None,
                description: None,
                content: Some(ReplacementContent {
                    data: Bytes::from("version two"),
                    content_type: "application/pdf".to_string(),
                }),
            },
        )
        .await
        .unwrap();

    assert_ne!(updated.locator, file.locator);
    assert_eq!(updated.size_bytes, "version two".len() as u64);
    assert_eq!(updated.content_type, "application/pdf");
    assert!(updated.uploaded_at > file.uploaded_at);
    assert!(app.blobs.contains(&updated.locator));
    assert!(!app.blobs.contains(&file.locator));

    let doc = app.grants.load(alice.user_id).await.unwrap();
    let entry = doc.shared_entry(file.id).unwrap();
    assert_eq!(entry.locator, updated.locator);
    assert_eq!(entry.size_bytes, updated.size_bytes);
    assert_eq!(entry.content_type, "application/pdf");
}

#[tokio::test]
async fn test_update_missing_file_is_not_found() {
    let app = helpers::TestApp::new();
    let owner = app.create_user("owner@x.com").await;

    let err = app
        .sharing
        .update_file(
            &owner,
            sharevault_core::types::id::FileId::new(),
            UpdateFileRequest {
                title: Some("x".to_string()),
                description: None,
                content: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, sharevault_core::error::ErrorKind::NotFound);
}
