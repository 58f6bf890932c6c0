//! Recipient-side shared view entities.

pub mod model;

pub use model::{SharedFileView, SharedViewEntry};
