//! # sharevault-policy
//!
//! Adapter to the external policy engine. The engine is the authority for
//! enforcement-side role decisions but never the system of record for
//! grant intent; every operation here is idempotent so a partial failure
//! followed by a retry converges instead of duplicating state.

pub mod gateway;
pub mod http;
pub mod memory;
mod retry;

pub use gateway::{PolicyGateway, RoleClaim};
pub use http::HttpPolicyGateway;
pub use memory::MemoryPolicyGateway;
