mod admin;
pub mod error;
mod middleware;
mod public;
mod state;

pub use state::{AdminCredentials, AppState};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, Uri};
use axum::middleware::{from_fn, from_fn_with_state};

use crate::application::error::HttpError;

use admin::build_admin_router;
use middleware::{admin_auth, log_responses, set_request_context};
use public::build_public_router;

/// Public and admin routes with the shared logging middleware.
pub fn build_router(state: AppState) -> Router {
    let admin = build_admin_router()
        .route_layer(from_fn_with_state(state.clone(), admin_auth))
        .layer(DefaultBodyLimit::max(state.upload_limit_bytes));

    Router::new()
        .merge(build_public_router())
        .merge(admin)
        .fallback(fallback)
        .with_state(state)
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
}

async fn fallback(uri: Uri) -> HttpError {
    HttpError::new(
        "infra::http::fallback",
        StatusCode::NOT_FOUND,
        "Not found",
        format!("no route for {}", uri.path()),
    )
}
