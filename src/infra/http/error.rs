use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::categories::AdminCategoryError;
use crate::application::comments::CommentError;
use crate::application::editor::EditorError;
use crate::application::error::ErrorReport;
use crate::application::feed::FeedError;
use crate::application::posts::AdminPostError;
use crate::application::render::RenderError;
use crate::application::repos::RepoError;
use crate::application::uploads::UploadError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const RENDER: &str = "render_error";
    pub const UPLOAD: &str = "upload_error";
    pub const BUCKET_MISSING: &str = "bucket_missing";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn invalid_input(message: &'static str, hint: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            message,
            Some(hint.into()),
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Admin token required",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { entity } => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Not found",
            Some(entity.to_string()),
        ),
        DomainError::Validation { message } => ApiError::invalid_input("Invalid input", message),
        DomainError::Invariant { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Invariant violated",
            Some(message),
        ),
    }
}

pub(crate) fn category_to_api(err: AdminCategoryError) -> ApiError {
    match err {
        AdminCategoryError::ConstraintViolation(field) => {
            ApiError::invalid_input("Invalid category", field)
        }
        AdminCategoryError::Slug(slug) => {
            ApiError::invalid_input("Invalid category", slug.to_string())
        }
        AdminCategoryError::NotFound => ApiError::not_found("category not found"),
        AdminCategoryError::Domain(domain) => domain_to_api(domain),
        AdminCategoryError::Repo(RepoError::Duplicate { constraint }) => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Category name already exists",
            Some(constraint),
        ),
        AdminCategoryError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn post_to_api(err: AdminPostError) -> ApiError {
    match err {
        AdminPostError::ConstraintViolation(field) => {
            ApiError::invalid_input("Invalid post", field)
        }
        AdminPostError::NotFound => ApiError::not_found("post not found"),
        AdminPostError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn comment_to_api(err: CommentError) -> ApiError {
    match err {
        CommentError::ConstraintViolation(field) => {
            ApiError::invalid_input("Invalid comment", field)
        }
        CommentError::TooLong { .. } => {
            ApiError::invalid_input("Invalid comment", err.to_string())
        }
        CommentError::NotFound => ApiError::not_found("comment not found"),
        CommentError::PostNotFound => ApiError::not_found("post not found"),
        CommentError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn feed_to_api(err: FeedError) -> ApiError {
    match err {
        FeedError::NotFound => ApiError::not_found("post not found"),
        FeedError::Render(render) => render_to_api(render),
        FeedError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn render_to_api(err: RenderError) -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::RENDER,
        "Markdown rendering failed",
        Some(err.to_string()),
    )
}

pub(crate) fn editor_to_api(err: EditorError) -> ApiError {
    match err {
        EditorError::Render(render) => render_to_api(render),
        EditorError::Upload(upload) => upload_to_api(upload),
    }
}

pub(crate) fn upload_to_api(err: UploadError) -> ApiError {
    match err {
        UploadError::EmptyPayload | UploadError::NotAnImage { .. } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::UPLOAD,
            "Upload rejected",
            Some(err.to_string()),
        ),
        UploadError::TooLarge { .. } => ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Upload too large",
            Some(err.to_string()),
        ),
        UploadError::BucketMissing { .. } => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::BUCKET_MISSING,
            "Image storage bucket is not configured",
            Some(err.to_string()),
        ),
        UploadError::Storage(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::UPLOAD,
            "Failed to store upload",
            Some(err.to_string()),
        ),
    }
}
