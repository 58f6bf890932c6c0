//! # sharevault-service
//!
//! Application services coordinating the three authorization views: the
//! owner's file list, each recipient's shared view, and the external
//! policy engine. Services hold no state of their own; all grant state
//! lives behind [`GrantStore`](sharevault_store::GrantStore) and the
//! policy gateway.

pub mod context;
pub mod file;
pub mod sharing;

pub use context::RequestContext;
pub use file::FileService;
pub use sharing::coordinator::SharingCoordinator;
pub use sharing::resolver::RoleResolver;
pub use sharing::sync::SharedViewSync;
