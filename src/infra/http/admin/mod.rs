//! Admin JSON API. Every route sits behind the bearer-token guard.

mod categories;
mod comments;
mod editor;
mod posts;
mod uploads;

use axum::Router;
use axum::routing::{delete, get, patch, post};

use super::state::AppState;

pub fn build_admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/api/categories",
            get(categories::list).post(categories::create),
        )
        .route("/admin/api/categories/move", post(categories::move_at))
        .route(
            "/admin/api/categories/{id}",
            patch(categories::update).delete(categories::delete),
        )
        .route(
            "/admin/api/categories/{id}/move",
            post(categories::move_by_id),
        )
        .route("/admin/api/posts", get(posts::list).post(posts::create))
        .route(
            "/admin/api/posts/{id}",
            get(posts::get).patch(posts::update).delete(posts::delete),
        )
        .route("/admin/api/posts/{id}/publish", post(posts::publish))
        .route(
            "/admin/api/posts/{id}/comments",
            delete(comments::delete_for_post),
        )
        .route("/admin/api/comments", get(comments::list))
        .route("/admin/api/comments/{id}", delete(comments::delete))
        .route("/admin/api/uploads", post(uploads::upload_image))
        .route("/admin/api/editor/preview", post(editor::preview))
        .route("/admin/api/editor/insert", post(editor::insert))
        .route("/admin/api/editor/images", post(editor::insert_image))
        .route("/admin/api/editor/paste", post(editor::paste))
}
