use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::infra::http::error::{ApiError, post_to_api};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct PostPayload {
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    body_markdown: String,
    category: String,
    #[serde(default)]
    cover_image: Option<String>,
    #[serde(default)]
    spotify_track_id: Option<String>,
    #[serde(default)]
    published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PublishPayload {
    published: bool,
}

pub(super) async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.list().await.map_err(post_to_api)?;
    Ok(Json(posts))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.find(id).await.map_err(post_to_api)?;
    Ok(Json(post))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(payload): Json<PostPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .create(
            state.admin.author(),
            CreatePostCommand {
                title: payload.title,
                excerpt: payload.excerpt,
                body_markdown: payload.body_markdown,
                category: payload.category,
                cover_image: payload.cover_image,
                spotify_track_id: payload.spotify_track_id,
                published: payload.published.unwrap_or(false),
            },
        )
        .await
        .map_err(post_to_api)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .update(UpdatePostCommand {
            id,
            title: payload.title,
            excerpt: payload.excerpt,
            body_markdown: payload.body_markdown,
            category: payload.category,
            cover_image: payload.cover_image,
            spotify_track_id: payload.spotify_track_id,
            published: payload.published,
        })
        .await
        .map_err(post_to_api)?;
    Ok(Json(post))
}

pub(super) async fn publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PublishPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .set_published(id, payload.published)
        .await
        .map_err(post_to_api)?;
    Ok(Json(post))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete(id).await.map_err(post_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
