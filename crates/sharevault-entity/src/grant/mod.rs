//! Grant entity: role, expiry, and the grant record itself.

pub mod expiry;
pub mod model;
pub mod role;

pub use expiry::{GrantExpiry, ShareDuration};
pub use model::Grant;
pub use role::GrantRole;
