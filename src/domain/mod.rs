//! Domain layer types and invariants.

pub mod categories;
pub mod comments;
pub mod editor;
pub mod error;
pub mod posts;
pub mod slug;
