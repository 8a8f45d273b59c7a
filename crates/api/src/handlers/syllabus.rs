//! Handlers for the `/syllabi` resource.

use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use syllabi_core::syllabus::{normalize_semester, validate_payload, UpdateRequest, UploadRequest};
use syllabi_core::types::DbId;
use syllabi_db::models::syllabus::{Syllabus, UpdateSyllabus};
use syllabi_db::repositories::SyllabusRepo;

use super::{syllabus_id, PRESIGNED_URL_HEADER};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::request::RequestContext;
use crate::query::ListSyllabiParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Public view of a syllabus.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusResponse {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub file_name: String,
    pub file_size: i32,
    pub content_type: String,
    pub year: i16,
    pub semester: String,
    /// Unix microseconds.
    pub date_added: i64,
    /// Whether object storage has confirmed the upload.
    pub received: bool,
}

impl From<Syllabus> for SyllabusResponse {
    fn from(s: Syllabus) -> Self {
        let received = s.is_confirmed();
        Self {
            id: s.id,
            user_id: s.user_id,
            course_id: s.course_id,
            file_name: s.file,
            file_size: s.file_size,
            content_type: s.content_type,
            year: s.year,
            semester: s.semester,
            date_added: s.date_added.timestamp_micros(),
            received,
        }
    }
}

/// Body of a successful intake.
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub id: DbId,
    pub upload_url: String,
}

fn location(state: &AppState, id: DbId) -> String {
    format!("{}/api/v1/syllabi/{id}", state.config.public_url)
}

fn presigned_header() -> HeaderName {
    HeaderName::from_static(PRESIGNED_URL_HEADER)
}

/// POST /api/v1/syllabi
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<UploadRequest>,
) -> AppResult<Response> {
    let receipt = state.uploads.intake(&ctx, input).await?;

    let headers = [
        (presigned_header(), receipt.upload_url.clone()),
        (LOCATION, location(&state, receipt.syllabus_id)),
    ];
    let body = DataResponse {
        data: IntakeResponse {
            id: receipt.syllabus_id,
            upload_url: receipt.upload_url,
        },
    };
    Ok((StatusCode::CREATED, headers, Json(body)).into_response())
}

/// GET /api/v1/syllabi
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListSyllabiParams>,
) -> AppResult<Json<DataResponse<Vec<SyllabusResponse>>>> {
    let filters = params.filters()?;
    let rows = SyllabusRepo::list(&state.pool, user.user_id, &filters, params.pagination()).await?;
    Ok(Json(DataResponse {
        data: rows.into_iter().map(SyllabusResponse::from).collect(),
    }))
}

/// GET /api/v1/syllabi/{id}
///
/// Records a view and returns a presigned download URL in `X-Presigned-Url`.
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = syllabus_id(&id)?;
    let syllabus = SyllabusRepo::get_visible(&state.pool, user.user_id, id).await?;

    let download_url = state
        .presigner
        .presign_download(&id.to_string(), state.config.download_url_ttl_secs)
        .await
        .map_err(|e| {
            AppError::InternalError(format!("Failed to presign download for syllabus {id}: {e}"))
        })?;

    let headers = [(presigned_header(), download_url)];
    let body = DataResponse {
        data: SyllabusResponse::from(syllabus),
    };
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

/// PATCH /api/v1/syllabi/{id}
///
/// An empty body still goes through the ownership check and only touches
/// `date_modified`.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateRequest>,
) -> AppResult<Response> {
    let id = syllabus_id(&id)?;
    validate_payload(&input)?;

    let update = UpdateSyllabus {
        year: input.year,
        semester: input
            .semester
            .as_deref()
            .and_then(normalize_semester)
            .map(str::to_string),
    };
    SyllabusRepo::update(&state.pool, user.user_id, id, &update).await?;

    Ok((StatusCode::NO_CONTENT, [(LOCATION, location(&state, id))]).into_response())
}

/// DELETE /api/v1/syllabi/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = syllabus_id(&id)?;
    SyllabusRepo::delete(&state.pool, user.user_id, id).await?;
    tracing::info!(syllabus_id = %id, user_id = %user.user_id, "Syllabus deleted");
    Ok(StatusCode::NO_CONTENT)
}
