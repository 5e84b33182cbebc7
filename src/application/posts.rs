use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::posts::PostRecord;

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub spotify_track_id: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub body_markdown: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub spotify_track_id: Option<String>,
    pub published: Option<bool>,
}

/// Admin post workflows. Concurrent edits of one post are last-write-wins.
#[derive(Clone)]
pub struct AdminPostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl AdminPostService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    /// Every post including drafts, newest first.
    pub async fn list(&self) -> Result<Vec<PostRecord>, AdminPostError> {
        self.reader
            .list_posts(PostListScope::Admin)
            .await
            .map_err(AdminPostError::from)
    }

    pub async fn find(&self, id: Uuid) -> Result<PostRecord, AdminPostError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or(AdminPostError::NotFound)
    }

    pub async fn create(
        &self,
        author: &str,
        command: CreatePostCommand,
    ) -> Result<PostRecord, AdminPostError> {
        let title = required(&command.title, "title")?;
        let category = required(&command.category, "category")?;

        let post = self
            .writer
            .create_post(CreatePostParams {
                title,
                excerpt: command.excerpt.trim().to_string(),
                body_markdown: command.body_markdown,
                category,
                cover_image: optional(command.cover_image),
                spotify_track_id: optional(command.spotify_track_id),
                published: command.published,
                author: author.to_string(),
            })
            .await?;

        info!(
            target = "application::posts",
            post_id = %post.id,
            published = post.published,
            "post created"
        );
        Ok(post)
    }

    pub async fn update(&self, command: UpdatePostCommand) -> Result<PostRecord, AdminPostError> {
        let title = required(&command.title, "title")?;
        let category = required(&command.category, "category")?;

        if self.reader.find_by_id(command.id).await?.is_none() {
            return Err(AdminPostError::NotFound);
        }

        let post = self
            .writer
            .update_post(UpdatePostParams {
                id: command.id,
                title,
                excerpt: command.excerpt.trim().to_string(),
                body_markdown: command.body_markdown,
                category,
                cover_image: optional(command.cover_image),
                spotify_track_id: optional(command.spotify_track_id),
                published: command.published,
            })
            .await?;
        Ok(post)
    }

    pub async fn set_published(
        &self,
        id: Uuid,
        published: bool,
    ) -> Result<PostRecord, AdminPostError> {
        if self.reader.find_by_id(id).await?.is_none() {
            return Err(AdminPostError::NotFound);
        }
        let post = self.writer.set_published(id, published).await?;
        info!(
            target = "application::posts",
            post_id = %id,
            published,
            "post visibility changed"
        );
        Ok(post)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminPostError> {
        if self.reader.find_by_id(id).await?.is_none() {
            return Err(AdminPostError::NotFound);
        }
        self.writer.delete_post(id).await?;
        Ok(())
    }
}

fn required(value: &str, field: &'static str) -> Result<String, AdminPostError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdminPostError::ConstraintViolation(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
