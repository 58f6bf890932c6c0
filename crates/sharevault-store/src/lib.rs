//! # sharevault-store
//!
//! Document store adapters. Each user has exactly one versioned document
//! (files owned + files shared with them); all writes are conditional on
//! the version read, and [`GrantStore`] wraps the raw store with bounded
//! compare-and-swap retry loops.

pub mod document;
pub mod grant_store;
pub mod memory;
pub mod postgres;

pub use document::{DocumentStore, VersionedDocument};
pub use grant_store::GrantStore;
pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
