//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use syllabi_core::error::CoreError;
use syllabi_core::types::DbId;

use crate::auth::jwt::{validate_token, Claims, ROLE_SERVICE, ROLE_USER};
use crate::error::AppError;
use crate::state::AppState;

/// Decode the Bearer token in the `Authorization` header.
fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, AppError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })?;

    validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))
}

/// Authenticated end user extracted from a JWT Bearer token.
///
/// Only `user`-role tokens are accepted; a service token on a user route is
/// rejected with 403 Forbidden.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's id (from `claims.sub`).
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != ROLE_USER {
            return Err(AppError::Core(CoreError::Forbidden(
                "User token required".into(),
            )));
        }

        let user_id = claims.sub.parse::<DbId>().map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Token does not identify a user".into()))
        })?;

        Ok(AuthUser { user_id })
    }
}

/// A machine caller (queue callback, storage event) holding a service token.
/// Rejects user tokens with 403 Forbidden.
#[derive(Debug, Clone)]
pub struct ServiceCaller {
    pub subject: String,
}

impl FromRequestParts<AppState> for ServiceCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != ROLE_SERVICE {
            return Err(AppError::Core(CoreError::Forbidden(
                "Service token required".into(),
            )));
        }
        Ok(ServiceCaller {
            subject: claims.sub,
        })
    }
}
