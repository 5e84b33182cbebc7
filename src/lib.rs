//! Portfolio and blog backend: public feed, admin content management, category
//! ordering and the markdown editor session that backs the post editor.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
