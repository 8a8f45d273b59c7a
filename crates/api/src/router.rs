//! HTTP surface assembly.
//!
//! [`build_app_router`] is the one place routes and middleware are put
//! together; `main.rs` serves it and the integration tests drive it with
//! `oneshot`.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::handlers::PRESIGNED_URL_HEADER;
use crate::middleware::request::REQUEST_ID_HEADER;
use crate::routes;
use crate::state::AppState;

/// Routes plus middleware, outermost layer first:
///
/// ```text
/// CORS -> assign x-request-id -> trace span -> echo x-request-id
///      -> timeout -> catch panic -> handler
/// ```
///
/// The request id is assigned before the trace span opens so every log line
/// of a request carries it, and it is what intake copies into the queued
/// verification job.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // `Router::layer` wraps everything added before it, so the last layer
    // listed here is the outermost.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .fallback(no_route)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// Unknown paths get the same `{error, code}` body as every other failure.
async fn no_route(uri: Uri) -> Response {
    let body = json!({
        "error": format!("No route for {}", uri.path()),
        "code": "NOT_FOUND",
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// CORS for the browser client.
///
/// The presigned URL and `Location` travel as headers, so they are exposed
/// explicitly. Panics at startup on an unparseable origin.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, request_id.clone()])
        .expose_headers([
            HeaderName::from_static(PRESIGNED_URL_HEADER),
            LOCATION,
            request_id,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
