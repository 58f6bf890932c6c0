//! # sharevault-entity
//!
//! Domain entity models for ShareVault: file records, grants, the
//! recipient-side shared view, and the per-user document that holds both.

pub mod file;
pub mod grant;
pub mod shared_view;
pub mod user;

pub use file::FileRecord;
pub use grant::{Grant, GrantExpiry, GrantRole, ShareDuration};
pub use shared_view::{SharedFileView, SharedViewEntry};
pub use user::UserDocument;
