//! Application services: admin workflows, the public feed and the editor session.

pub mod categories;
pub mod comments;
pub mod editor;
pub mod error;
pub mod feed;
pub mod posts;
pub mod render;
pub mod repos;
pub mod uploads;
