//! Core trait definitions implemented by provider crates.

pub mod blob;
