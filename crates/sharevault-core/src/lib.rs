//! # sharevault-core
//!
//! Core crate for ShareVault. Contains configuration schemas, typed
//! identifiers, the blob-store trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ShareVault crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
