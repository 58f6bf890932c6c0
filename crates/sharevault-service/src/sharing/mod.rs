//! Grant lifecycle and the recipient-side shared view.

pub mod coordinator;
pub mod resolver;
pub mod sync;

pub use coordinator::{CreateGrantRequest, SharingCoordinator, UpdateFileRequest};
pub use resolver::RoleResolver;
pub use sync::SharedViewSync;
