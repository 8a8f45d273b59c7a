pub mod health;
pub mod syllabus;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /syllabi                          list, create (user)
/// /syllabi/{id}                     get, update, delete (user)
/// /syllabi/{id}/reaction            react, unreact (user)
/// /syllabi/{id}/reactions           list reactions (user)
/// /syllabi/{id}/sync                storage confirmation (service)
/// /syllabi/{id}/verify              delayed verification (service)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/syllabi", syllabus::router())
}
