//! Shared helpers for API integration tests: a test app wired with recording
//! fakes, request helpers, token minting and database fixtures.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use syllabi_api::auth::jwt::{generate_service_token, generate_token, JwtConfig, ROLE_USER};
use syllabi_api::config::ServerConfig;
use syllabi_api::router::build_app_router;
use syllabi_api::state::AppState;
use syllabi_api::upload::UploadOrchestrator;
use syllabi_cloud::{CloudError, Presigner};
use syllabi_core::types::DbId;
use syllabi_core::upload::{Environment, UploadTiming};
use syllabi_events::{DelayedJob, JobQueue, Notifier, NotifyError, QueueError};
use tower::ServiceExt;

pub const PUBLIC_URL: &str = "http://api.test";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        environment: Environment::Development,
        public_url: PUBLIC_URL.to_string(),
        download_url_ttl_secs: 3600,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            service_token_expiry_mins: 60,
        },
        upload: UploadTiming::for_environment(Environment::Development),
        sweep_interval_secs: 60,
    }
}

// ---------------------------------------------------------------------------
// Recording fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPresigner {
    pub uploads: Mutex<Vec<(String, String, String, u64)>>,
    pub downloads: Mutex<Vec<(String, u64)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Presigner for RecordingPresigner {
    async fn presign_upload(
        &self,
        object_key: &str,
        content_type: &str,
        checksum: &str,
        ttl_secs: u64,
    ) -> Result<String, CloudError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CloudError::Presign("storage unavailable".into()));
        }
        self.uploads.lock().unwrap().push((
            object_key.to_string(),
            content_type.to_string(),
            checksum.to_string(),
            ttl_secs,
        ));
        Ok(format!("https://storage.test/syllabi/{object_key}?op=put&ttl={ttl_secs}"))
    }

    async fn presign_download(
        &self,
        object_key: &str,
        ttl_secs: u64,
    ) -> Result<String, CloudError> {
        self.downloads
            .lock()
            .unwrap()
            .push((object_key.to_string(), ttl_secs));
        Ok(format!("https://storage.test/syllabi/{object_key}?op=get&ttl={ttl_secs}"))
    }
}

#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<(DelayedJob, u64)>>,
    pub fail: AtomicBool,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<(DelayedJob, u64)> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: &DelayedJob, delay_secs: u64) -> Result<(), QueueError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        self.jobs.lock().unwrap().push((job.clone(), delay_secs));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Missing { email: String, course: String },
    Received { email: String, course: String },
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notice> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_upload_missing(
        &self,
        email: &str,
        _name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Notice::Missing {
            email: email.to_string(),
            course: course_label.to_string(),
        });
        Ok(())
    }

    async fn notify_upload_received(
        &self,
        email: &str,
        _name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(Notice::Received {
            email: email.to_string(),
            course: course_label.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test app
// ---------------------------------------------------------------------------

/// The application router plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub config: ServerConfig,
    pub presigner: Arc<RecordingPresigner>,
    pub queue: Arc<RecordingQueue>,
    pub notifier: Arc<RecordingNotifier>,
    pub uploads: Arc<UploadOrchestrator>,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application with the same middleware stack as `main.rs`.
pub fn spawn_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let presigner = Arc::new(RecordingPresigner::default());
    let queue = Arc::new(RecordingQueue::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState::new(
        pool,
        Arc::new(config.clone()),
        Arc::clone(&presigner) as Arc<dyn Presigner>,
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let uploads = Arc::clone(&state.uploads);

    TestApp {
        router: build_app_router(state, &config),
        config,
        presigner,
        queue,
        notifier,
        uploads,
    }
}

/// Convenience for tests that only need the router.
pub fn build_test_app(pool: PgPool) -> Router {
    spawn_app(pool).router
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn user_token(user_id: DbId) -> String {
    generate_token(&user_id.to_string(), ROLE_USER, 15, &test_config().jwt).unwrap()
}

pub fn service_token() -> String {
    generate_service_token(&test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn seed_user(pool: &PgPool, name: &str) -> DbId {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    sqlx::query_scalar("INSERT INTO users (full_name, email) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_course(pool: &PgPool, code: &str, title: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO courses (course, title) VALUES ($1, $2) RETURNING id")
        .bind(code)
        .bind(title)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn upload_body(course_id: DbId) -> serde_json::Value {
    serde_json::json!({
        "courseId": course_id,
        "fileName": "cps109-outline.pdf",
        "fileSize": 48213,
        "contentType": "application/pdf",
        "checksum": "yZRlqg==",
        "year": 2024,
        "semester": "fall",
    })
}

/// Move `date_added` back so the row looks `secs` old to the expiry sweep.
pub async fn backdate(pool: &PgPool, id: DbId, secs: i64) {
    sqlx::query("UPDATE syllabi SET date_added = NOW() - make_interval(secs => $2) WHERE id = $1")
        .bind(id)
        .bind(secs as f64)
        .execute(pool)
        .await
        .unwrap();
}

/// Run an intake as `owner` and return the new syllabus id.
pub async fn intake(app: &TestApp, owner: DbId, course_id: DbId) -> DbId {
    let response = post_json(
        app.app(),
        "/api/v1/syllabi",
        &user_token(owner),
        upload_body(course_id),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().parse().unwrap()
}
