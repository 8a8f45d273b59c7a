//! Machine callbacks driving the upload lifecycle.
//!
//! `sync` is called by the storage-event hook once the file lands;
//! `verify` is called by the delayed job scheduled at intake. Both accept
//! only service tokens and both are safe to repeat.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

use super::syllabus_id;
use crate::error::AppResult;
use crate::middleware::auth::ServiceCaller;
use crate::middleware::request::request_id;
use crate::state::AppState;

/// POST|GET /api/v1/syllabi/{id}/sync
pub async fn sync(
    State(state): State<AppState>,
    caller: ServiceCaller,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = syllabus_id(&id)?;
    tracing::debug!(syllabus_id = %id, caller = %caller.subject, "Storage confirmation received");
    state.uploads.confirm(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST|GET /api/v1/syllabi/{id}/verify
pub async fn verify(
    State(state): State<AppState>,
    _caller: ServiceCaller,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = syllabus_id(&id)?;
    state.uploads.verify(id, request_id(&headers).as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
