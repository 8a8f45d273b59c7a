//! Handlers for likes and dislikes on a syllabus.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use syllabi_core::syllabus::ReactionKind;
use syllabi_core::types::DbId;
use syllabi_db::models::reaction::SyllabusReaction;
use syllabi_db::repositories::ReactionRepo;

use super::syllabus_id;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /syllabi/{id}/reaction`.
#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    /// `"like"` or `"dislike"`.
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub syllabus_id: DbId,
    pub user_id: DbId,
    pub is_dislike: bool,
    /// Unix microseconds.
    pub date_added: i64,
}

impl From<SyllabusReaction> for ReactionResponse {
    fn from(r: SyllabusReaction) -> Self {
        Self {
            syllabus_id: r.syllabus_id,
            user_id: r.user_id,
            is_dislike: r.is_dislike,
            date_added: r.date_added.timestamp_micros(),
        }
    }
}

/// POST /api/v1/syllabi/{id}/reaction
pub async fn react(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<ReactionRequest>,
) -> AppResult<StatusCode> {
    let id = syllabus_id(&id)?;
    let kind = ReactionKind::parse(&input.action)?;
    ReactionRepo::set(&state.pool, user.user_id, id, kind.is_dislike()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/syllabi/{id}/reaction
pub async fn unreact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = syllabus_id(&id)?;
    ReactionRepo::remove(&state.pool, user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/syllabi/{id}/reactions
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<ReactionResponse>>>> {
    let id = syllabus_id(&id)?;
    let reactions = ReactionRepo::list_for_syllabus(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: reactions.into_iter().map(ReactionResponse::from).collect(),
    }))
}
