//! Blob store provider implementations.

pub mod local;
pub mod memory;
pub mod s3;
