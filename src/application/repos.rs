//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::categories::{CategoryColor, CategoryRecord, SwapPlan};
use crate::domain::comments::CommentRecord;
use crate::domain::posts::PostRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub name: String,
    pub slug: String,
    pub color: CategoryColor,
    pub display_order: i32,
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryParams {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: CategoryColor,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All categories, ascending by `display_order`.
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError>;

    /// Apply both halves of `plan` atomically. Each row is only updated while
    /// it still holds its `from` order; otherwise nothing is written and
    /// `RepoError::Integrity` is returned.
    async fn swap_display_order(&self, plan: &SwapPlan) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    Public,
    Admin,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub spotify_track_id: Option<String>,
    pub published: bool,
    pub author: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub spotify_track_id: Option<String>,
    pub published: Option<bool>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts visible in `scope`, newest first.
    async fn list_posts(&self, scope: PostListScope) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn set_published(&self, id: Uuid, published: bool) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_name: String,
    pub content: String,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Every comment, newest first.
    async fn list_comments(&self) -> Result<Vec<CommentRecord>, RepoError>;

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError>;

    /// Remove every comment of `post_id`, returning how many were deleted.
    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}
