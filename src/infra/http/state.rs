use std::sync::Arc;
use std::time::Duration;

use subtle::ConstantTimeEq;

use crate::application::categories::AdminCategoryService;
use crate::application::comments::{AdminCommentService, PublicCommentService};
use crate::application::feed::FeedService;
use crate::application::posts::AdminPostService;
use crate::application::render::PreviewRenderer;
use crate::application::uploads::ImageUploadService;
use crate::infra::db::PostgresRepositories;
use crate::infra::uploads::FilesystemObjectStore;

/// Shared token for the admin surface, plus the author name stamped on posts
/// it creates.
#[derive(Clone)]
pub struct AdminCredentials {
    token: Arc<str>,
    author: Arc<str>,
}

impl AdminCredentials {
    pub fn new(token: impl Into<Arc<str>>, author: impl Into<Arc<str>>) -> Self {
        Self {
            token: token.into(),
            author: author.into(),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Constant-time comparison. An empty configured token admits nobody.
    pub fn verify(&self, presented: &str) -> bool {
        !self.token.is_empty() && bool::from(self.token.as_bytes().ct_eq(presented.as_bytes()))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
    pub categories: Arc<AdminCategoryService>,
    pub posts: Arc<AdminPostService>,
    pub comments: Arc<AdminCommentService>,
    pub public_comments: Arc<PublicCommentService>,
    pub uploads: Arc<ImageUploadService>,
    /// Bucket the upload service writes to, served back under `/media`.
    pub media: Arc<FilesystemObjectStore>,
    pub renderer: Arc<dyn PreviewRenderer>,
    pub admin: AdminCredentials,
    pub scroll_debounce: Duration,
    pub upload_limit_bytes: usize,
    /// Absent when running against in-memory repositories.
    pub db: Option<Arc<PostgresRepositories>>,
}
