use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::categories::{CreateCategoryCommand, UpdateCategoryCommand};
use crate::domain::categories::{CategoryColor, MoveDirection};
use crate::infra::http::error::{ApiError, category_to_api};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct CategoryPayload {
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    color: CategoryColor,
}

/// Move addressed by position in the list the admin panel shows.
#[derive(Debug, Deserialize)]
pub(super) struct MoveAtPayload {
    index: usize,
    direction: MoveDirection,
}

#[derive(Debug, Deserialize)]
pub(super) struct MovePayload {
    direction: MoveDirection,
}

pub(super) async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state.categories.list().await.map_err(category_to_api)?;
    Ok(Json(categories))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .categories
        .create(CreateCategoryCommand {
            name: payload.name,
            slug: payload.slug,
            color: payload.color,
        })
        .await
        .map_err(category_to_api)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .categories
        .update(UpdateCategoryCommand {
            id,
            name: payload.name,
            slug: payload.slug,
            color: payload.color,
        })
        .await
        .map_err(category_to_api)?;
    Ok(Json(category))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .categories
        .delete(id)
        .await
        .map_err(category_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn move_at(
    State(state): State<AppState>,
    Json(payload): Json<MoveAtPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .categories
        .move_at(payload.index, payload.direction)
        .await
        .map_err(category_to_api)?;
    Ok(Json(outcome))
}

pub(super) async fn move_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MovePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .categories
        .move_category(id, payload.direction)
        .await
        .map_err(category_to_api)?;
    Ok(Json(outcome))
}
