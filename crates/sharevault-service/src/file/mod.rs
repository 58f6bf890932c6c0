//! File upload and listing.

pub mod service;

pub use service::{FileService, UploadFileRequest};
