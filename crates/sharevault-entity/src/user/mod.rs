//! Per-user document entity.

pub mod model;

pub use model::UserDocument;
