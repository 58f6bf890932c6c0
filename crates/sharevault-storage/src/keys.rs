//! Blob key construction.
//!
//! Centralising key construction keeps every stored object under the
//! `uploads/{user_id}/{uuid}.{ext}` namespace.

use uuid::Uuid;

use sharevault_core::types::id::UserId;

/// Build a fresh blob key for an upload by the given user.
///
/// The extension is derived from the MIME subtype, the same way the
/// upload boundary names objects.
pub fn upload_key(user_id: UserId, content_type: &str) -> String {
    format!(
        "uploads/{user_id}/{}.{}",
        Uuid::new_v4(),
        extension_for(content_type)
    )
}

/// Derive a file extension from a MIME type, falling back to `bin`.
fn extension_for(content_type: &str) -> &str {
    match content_type.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => subtype,
        _ => "bin",
    }
}
