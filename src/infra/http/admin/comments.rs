use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::comments::CommentFilter;
use crate::infra::http::error::{ApiError, comment_to_api};
use crate::infra::http::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CommentQuery {
    post_id: Option<Uuid>,
    search: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClearedComments {
    removed: u64,
}

pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = CommentFilter {
        post_id: query.post_id,
        search: query.search,
    };
    let comments = state
        .comments
        .list(&filter)
        .await
        .map_err(comment_to_api)?;
    Ok(Json(comments))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.comments.delete(id).await.map_err(comment_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn delete_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .comments
        .delete_for_post(post_id)
        .await
        .map_err(comment_to_api)?;
    Ok(Json(ClearedComments { removed }))
}
