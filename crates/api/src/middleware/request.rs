//! Request-scoped values handed explicitly through the call chain.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Header set by `SetRequestIdLayer` on every incoming request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request values needed below the handler layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request id assigned at the edge, if any.
    pub request_id: Option<String>,
    pub user: AuthUser,
}

/// Read the request id header, if present and valid UTF-8.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequestContext {
            request_id: request_id(&parts.headers),
            user,
        })
    }
}
