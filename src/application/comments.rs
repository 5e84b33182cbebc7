use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, CreateCommentParams, PostsRepo, RepoError};
use crate::domain::comments::{CommentFilter, CommentRecord};

/// Longest accepted display name, in characters.
pub const MAX_AUTHOR_NAME_CHARS: usize = 80;

/// Longest accepted comment body, in characters.
pub const MAX_COMMENT_CHARS: usize = 4_000;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("comment not found")]
    NotFound,
    #[error("post not found")]
    PostNotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateCommentCommand {
    pub post_id: Uuid,
    pub author_name: String,
    pub content: String,
}

/// Comment moderation for the admin panel.
#[derive(Clone)]
pub struct AdminCommentService {
    comments: Arc<dyn CommentsRepo>,
}

impl AdminCommentService {
    pub fn new(comments: Arc<dyn CommentsRepo>) -> Self {
        Self { comments }
    }

    /// Every comment, newest first, narrowed by `filter`.
    pub async fn list(&self, filter: &CommentFilter) -> Result<Vec<CommentRecord>, CommentError> {
        let comments = self.comments.list_comments().await?;
        Ok(filter.apply(comments))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CommentError> {
        self.comments.delete_comment(id).await.map_err(|err| match err {
            RepoError::NotFound => CommentError::NotFound,
            other => CommentError::Repo(other),
        })?;
        info!(
            target = "application::comments",
            comment_id = %id,
            "comment deleted"
        );
        Ok(())
    }

    /// Remove all comments of one post and report how many went.
    pub async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, CommentError> {
        let removed = self.comments.delete_for_post(post_id).await?;
        info!(
            target = "application::comments",
            post_id = %post_id,
            removed,
            "post comments cleared"
        );
        Ok(removed)
    }
}

/// Reader-facing comment thread under a published post.
#[derive(Clone)]
pub struct PublicCommentService {
    comments: Arc<dyn CommentsRepo>,
    posts: Arc<dyn PostsRepo>,
}

impl PublicCommentService {
    pub fn new(comments: Arc<dyn CommentsRepo>, posts: Arc<dyn PostsRepo>) -> Self {
        Self { comments, posts }
    }

    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, CommentError> {
        self.ensure_published(post_id).await?;
        self.comments
            .list_for_post(post_id)
            .await
            .map_err(CommentError::from)
    }

    pub async fn create(
        &self,
        command: CreateCommentCommand,
    ) -> Result<CommentRecord, CommentError> {
        let author_name = bounded(&command.author_name, "author_name", MAX_AUTHOR_NAME_CHARS)?;
        let content = bounded(&command.content, "content", MAX_COMMENT_CHARS)?;
        self.ensure_published(command.post_id).await?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id: command.post_id,
                author_name,
                content,
            })
            .await?;
        Ok(comment)
    }

    async fn ensure_published(&self, post_id: Uuid) -> Result<(), CommentError> {
        match self.posts.find_by_id(post_id).await? {
            Some(post) if post.published => Ok(()),
            _ => Err(CommentError::PostNotFound),
        }
    }
}

fn bounded(value: &str, field: &'static str, max: usize) -> Result<String, CommentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CommentError::ConstraintViolation(field));
    }
    if trimmed.chars().count() > max {
        return Err(CommentError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}
