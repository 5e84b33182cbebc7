use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::infra::http::error::{ApiError, upload_to_api};
use crate::infra::http::state::AppState;

pub(super) async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file_name = None;
    let mut content_type = None;
    let mut data: Option<bytes::Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart payload", Some(err.to_string())))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            data = Some(field.bytes().await.map_err(|err| {
                ApiError::bad_request("failed to read upload", Some(err.to_string()))
            })?);
            break;
        }
    }

    let data = data.ok_or_else(|| ApiError::bad_request("missing file", None))?;
    let file_name = file_name.unwrap_or_default();

    let uploaded = state
        .uploads
        .upload(&file_name, content_type.as_deref(), data)
        .await
        .map_err(upload_to_api)?;

    Ok((StatusCode::CREATED, Json(uploaded)))
}
