use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
    },
    domain::posts::PostRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    excerpt: String,
    body_markdown: String,
    category: String,
    cover_image: Option<String>,
    spotify_track_id: Option<String>,
    published: bool,
    author: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            excerpt: row.excerpt,
            body_markdown: row.body_markdown,
            category: row.category,
            cover_image: row.cover_image,
            spotify_track_id: row.spotify_track_id,
            published: row.published,
            author: row.author,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const POST_COLUMNS: &str = "id, title, excerpt, body_markdown, category, cover_image, \
    spotify_track_id, published, author, created_at, updated_at";

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self, scope: PostListScope) -> Result<Vec<PostRecord>, RepoError> {
        let filter = match scope {
            PostListScope::Public => "WHERE published",
            PostListScope::Admin => "",
        };
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts {filter} ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "INSERT INTO posts \
             (id, title, excerpt, body_markdown, category, cover_image, spotify_track_id, published, author) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.excerpt)
        .bind(&params.body_markdown)
        .bind(&params.category)
        .bind(params.cover_image.as_deref())
        .bind(params.spotify_track_id.as_deref())
        .bind(params.published)
        .bind(&params.author)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET \
                 title = $2, excerpt = $3, body_markdown = $4, category = $5, \
                 cover_image = $6, spotify_track_id = $7, \
                 published = COALESCE($8, published), updated_at = now() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.excerpt)
        .bind(&params.body_markdown)
        .bind(&params.category)
        .bind(params.cover_image.as_deref())
        .bind(params.spotify_track_id.as_deref())
        .bind(params.published)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET published = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
