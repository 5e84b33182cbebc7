//! Stateless editor operations. Each request carries the source and the
//! selection; the response carries the edited source, the new selection and
//! a fresh preview.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::Field;
use axum::response::IntoResponse;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::editor::EditorSession;
use crate::application::render::RenderedPreview;
use crate::application::uploads::UploadedImage;
use crate::domain::editor::{ClipboardItem, Insertion, MarkdownSyntax, PendingImage, Selection};
use crate::infra::http::error::{ApiError, editor_to_api, render_to_api};
use crate::infra::http::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct PreviewPayload {
    markdown: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct InsertPayload {
    content: String,
    #[serde(default)]
    selection: Selection,
    syntax: MarkdownSyntax,
}

#[derive(Debug, Serialize)]
struct EditorSnapshot {
    content: String,
    selection: Selection,
    preview: RenderedPreview,
    awaiting_images: bool,
}

impl EditorSnapshot {
    fn of(session: &EditorSession) -> Self {
        Self {
            content: session.content().to_string(),
            selection: session.selection(),
            preview: session.preview().clone(),
            awaiting_images: session.awaiting_images(),
        }
    }
}

#[derive(Debug, Serialize)]
struct InsertResponse {
    #[serde(flatten)]
    editor: EditorSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragment: Option<String>,
    /// Present for image requests; echo it back with the uploaded file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_image: Option<PendingImage>,
}

#[derive(Debug, Serialize)]
struct ImageResponse {
    #[serde(flatten)]
    editor: EditorSnapshot,
    image: Option<UploadedImage>,
}

pub(super) async fn preview(
    State(state): State<AppState>,
    Json(payload): Json<PreviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let rendered = state
        .renderer
        .render(&payload.markdown)
        .map_err(render_to_api)?;
    Ok(Json(rendered))
}

pub(super) async fn insert(
    State(state): State<AppState>,
    Json(payload): Json<InsertPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = open_session(&state, payload.content, payload.selection)?;
    let insertion = session
        .apply_syntax(payload.syntax)
        .map_err(editor_to_api)?;

    let (fragment, pending_image) = match insertion {
        Insertion::Inserted { fragment } => (Some(fragment), None),
        Insertion::ImageRequested(pending) => (None, Some(pending)),
    };

    Ok(Json(InsertResponse {
        editor: EditorSnapshot::of(&session),
        fragment,
        pending_image,
    }))
}

/// Multipart fields: `content`, `start`, `end` and `file`. `start`/`end`
/// are the selection captured when the upload began, not the current one.
pub(super) async fn insert_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = EditorForm::default();
    let mut file: Option<ClipboardItem> = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("file") => file = Some(read_item(field).await?),
            _ => form.read(field).await?,
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("missing file", None))?;
    let pending = PendingImage {
        selection: form.selection(),
    };
    let mut session = open_session(&state, form.content, Selection::default())?;
    let file_name = file.file_name.unwrap_or_default();

    let uploaded = session
        .upload_image(
            &state.uploads,
            pending,
            &file_name,
            Some(file.mime_type.as_str()),
            file.data,
        )
        .await
        .map_err(editor_to_api)?;

    Ok(Json(ImageResponse {
        editor: EditorSnapshot::of(&session),
        image: Some(uploaded),
    }))
}

/// Multipart fields: `content`, `start`, `end` and one `item` per clipboard
/// entry. Only the first image item is uploaded.
pub(super) async fn paste(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = EditorForm::default();
    let mut items = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("item") => items.push(read_item(field).await?),
            _ => form.read(field).await?,
        }
    }

    let selection = form.selection();
    let mut session = open_session(&state, form.content, selection)?;
    let image = session
        .paste_image(&state.uploads, items, OffsetDateTime::now_utc())
        .await
        .map_err(editor_to_api)?;

    Ok(Json(ImageResponse {
        editor: EditorSnapshot::of(&session),
        image,
    }))
}

fn open_session(
    state: &AppState,
    content: String,
    selection: Selection,
) -> Result<EditorSession, ApiError> {
    let mut session = EditorSession::new(content, state.renderer.clone(), state.scroll_debounce)
        .map_err(editor_to_api)?;
    session.select(selection.start(), selection.end());
    Ok(session)
}

/// `start`/`end` are UTF-16 code unit offsets, as the textarea reports them.
#[derive(Debug, Default)]
struct EditorForm {
    content: String,
    start: usize,
    end: usize,
}

impl EditorForm {
    fn selection(&self) -> Selection {
        Selection::new(self.start, self.end)
    }

    async fn read(&mut self, field: Field<'_>) -> Result<(), ApiError> {
        let name = field.name().map(str::to_string);
        let text = field
            .text()
            .await
            .map_err(|err| ApiError::bad_request("failed to read field", Some(err.to_string())))?;

        match name.as_deref() {
            Some("content") => self.content = text,
            Some("start") => self.start = parse_offset("start", &text)?,
            Some("end") => self.end = parse_offset("end", &text)?,
            _ => {}
        }
        Ok(())
    }
}

fn parse_offset(field: &'static str, value: &str) -> Result<usize, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid_input("Invalid selection offset", field))
}

async fn next_field<'a>(multipart: &'a mut Multipart) -> Result<Option<Field<'a>>, ApiError> {
    multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart payload", Some(err.to_string())))
}

async fn read_item(field: Field<'_>) -> Result<ClipboardItem, ApiError> {
    let file_name = field.file_name().map(str::to_string);
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data: Bytes = field
        .bytes()
        .await
        .map_err(|err| ApiError::bad_request("failed to read upload", Some(err.to_string())))?;

    Ok(ClipboardItem {
        mime_type,
        file_name,
        data,
    })
}
