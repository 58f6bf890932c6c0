//! # sharevault-storage
//!
//! Blob store providers. The blob store holds opaque file bytes by key;
//! grant state never lives here.

pub mod keys;
pub mod providers;

pub use providers::local::LocalBlobStore;
pub use providers::memory::MemoryBlobStore;
pub use providers::s3::S3BlobStore;
