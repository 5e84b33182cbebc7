use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CommentsRepo, CreateCommentParams, RepoError},
    domain::comments::CommentRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    author_name: String,
    content: String,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_name: row.author_name,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_comments(&self) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_name, content, created_at \
             FROM comments ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_name, content, created_at \
             FROM comments WHERE post_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "INSERT INTO comments (id, post_id, author_name, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, post_id, author_name, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(params.post_id)
        .bind(&params.author_name)
        .bind(&params.content)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
