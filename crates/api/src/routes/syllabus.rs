//! Route definitions for the `/syllabi` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{reaction, syllabus, verification};
use crate::state::AppState;

/// Routes mounted at `/syllabi`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /{id}              -> get_by_id
/// PATCH  /{id}              -> update
/// DELETE /{id}              -> delete
///
/// POST   /{id}/reaction     -> react
/// DELETE /{id}/reaction     -> unreact
/// GET    /{id}/reactions    -> list
///
/// POST   /{id}/sync         -> sync     (GET accepted for storage hooks)
/// POST   /{id}/verify       -> verify   (GET accepted for queue gateways)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(syllabus::list).post(syllabus::create))
        .route(
            "/{id}",
            get(syllabus::get_by_id)
                .patch(syllabus::update)
                .delete(syllabus::delete),
        )
        .route(
            "/{id}/reaction",
            post(reaction::react).delete(reaction::unreact),
        )
        .route("/{id}/reactions", get(reaction::list))
        .route(
            "/{id}/sync",
            post(verification::sync).get(verification::sync),
        )
        .route(
            "/{id}/verify",
            post(verification::verify).get(verification::verify),
        )
}
