//! Reader-facing endpoints: the JSON feed, comment threads and uploaded media.

use axum::extract::{Path, Query, State};
use axum::http::{
    HeaderValue, StatusCode,
    header::{CACHE_CONTROL, CONTENT_TYPE},
};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::comments::CreateCommentCommand;
use crate::application::error::ErrorReport;
use crate::application::uploads::StorageError;

use super::error::{ApiError, comment_to_api, feed_to_api};
use super::state::AppState;

pub fn build_public_router() -> Router<AppState> {
    Router::new()
        .route("/api/home", get(home))
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{id}", get(post_detail))
        .route(
            "/api/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/media/{*key}", get(serve_media))
        .route("/_health/db", get(db_health))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CategoryQuery {
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    author_name: String,
    content: String,
}

async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let feed = state.feed.home().await.map_err(feed_to_api)?;
    Ok(Json(feed))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state
        .feed
        .list(query.category.as_deref())
        .await
        .map_err(feed_to_api)?;
    Ok(Json(listing))
}

async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.feed.post(id).await.map_err(feed_to_api)?;
    Ok(Json(detail))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .public_comments
        .list_for_post(id)
        .await
        .map_err(comment_to_api)?;
    Ok(Json(comments))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .public_comments
        .create(CreateCommentCommand {
            post_id: id,
            author_name: payload.author_name,
            content: payload.content,
        })
        .await
        .map_err(comment_to_api)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn serve_media(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.media.read(&key).await {
        Ok(Some(data)) => {
            let mime = mime_guess::from_path(&key).first_or_octet_stream();
            let mut response = data.into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
                headers.insert(CONTENT_TYPE, value);
            }
            headers.insert(
                CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            );
            response
        }
        Ok(None) => ApiError::not_found("media not found").into_response(),
        Err(StorageError::InvalidKey { .. }) => {
            ApiError::not_found("media not found").into_response()
        }
        Err(err) => {
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            ErrorReport::from_error(
                "infra::http::media",
                StatusCode::INTERNAL_SERVER_ERROR,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn db_health(State(state): State<AppState>) -> Response {
    let Some(db) = state.db.as_ref() else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
