//! Delayed verification jobs.
//!
//! Intake schedules exactly one [`DelayedJob`] per syllabus. When the delay
//! elapses the job's callback URL is POSTed with the job's own auth header,
//! which drives the verification step.
//!
//! Two adapters are provided:
//!
//! - [`HttpJobQueue`] hands the job to an external queue gateway that owns
//!   the delay and redelivery (at-least-once). The hand-off itself is tried
//!   once.
//! - [`LocalDelayQueue`] keeps the delay in a detached tokio task. Pending
//!   jobs are lost on restart, so it is meant for development only.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use syllabi_core::types::DbId;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::delivery::webhook::{WebhookDelivery, WebhookError};

/// Header carrying the originating request id on the callback.
const REQUEST_ID_HEADER: &str = "x-request-id";

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A callback to fire once, after a delay.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayedJob {
    /// The syllabus the job is about.
    pub subject_id: DbId,
    pub callback_url: String,
    /// Full `Authorization` header value for the callback.
    pub auth_header: String,
    /// Request id of the intake that scheduled the job.
    pub request_id: Option<String>,
}

impl std::fmt::Debug for DelayedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedJob")
            .field("subject_id", &self.subject_id)
            .field("callback_url", &self.callback_url)
            .field("auth_header", &"<redacted>")
            .field("request_id", &self.request_id)
            .finish()
    }
}

impl DelayedJob {
    /// Headers sent with the callback.
    fn callback_headers(&self) -> Result<HeaderMap, QueueError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&self.auth_header)
            .map_err(|_| QueueError::InvalidJob("auth header is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        if let Some(request_id) = &self.request_id {
            if let Ok(value) = HeaderValue::from_str(request_id) {
                headers.insert(REQUEST_ID_HEADER, value);
            }
        }
        Ok(headers)
    }

    /// JSON body sent with the callback. The auth header travels as a header.
    fn callback_body(&self) -> serde_json::Value {
        serde_json::json!({
            "subjectId": self.subject_id,
            "requestId": self.request_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for job scheduling failures.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The job cannot be delivered as built.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// The queue gateway could not be reached or rejected the job.
    #[error("Queue delivery failed: {0}")]
    Delivery(#[from] WebhookError),

    /// The queue is shutting down and accepts no new jobs.
    #[error("Queue is closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// JobQueue trait
// ---------------------------------------------------------------------------

/// Schedules a [`DelayedJob`] to fire after `delay_secs`.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &DelayedJob, delay_secs: u64) -> Result<(), QueueError>;
}

// ---------------------------------------------------------------------------
// QueueConfig
// ---------------------------------------------------------------------------

/// Configuration for the external queue gateway.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Endpoint that accepts `{ "job": …, "delaySeconds": … }`.
    pub url: String,
}

impl QueueConfig {
    /// Returns `None` if `QUEUE_URL` is not set, signalling that the
    /// in-process [`LocalDelayQueue`] should be used.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("QUEUE_URL").ok().filter(|u| !u.is_empty())?;
        Some(Self { url })
    }
}

// ---------------------------------------------------------------------------
// HttpJobQueue
// ---------------------------------------------------------------------------

/// Hands jobs to an external delayed-message gateway.
///
/// Enqueue runs inside the intake request, so the hand-off is a single
/// attempt bounded by the delivery timeout. A failed hand-off leaves the row
/// unconfirmed for the expiry sweep.
pub struct HttpJobQueue {
    config: QueueConfig,
    delivery: WebhookDelivery,
}

impl HttpJobQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            delivery: WebhookDelivery::new().with_retry_delays(Vec::new()),
        }
    }
}

/// Body POSTed to the queue gateway.
fn gateway_payload(job: &DelayedJob, delay_secs: u64) -> serde_json::Value {
    serde_json::json!({
        "job": job,
        "delaySeconds": delay_secs,
    })
}

#[async_trait]
impl JobQueue for HttpJobQueue {
    async fn enqueue(&self, job: &DelayedJob, delay_secs: u64) -> Result<(), QueueError> {
        let mut headers = HeaderMap::new();
        if let Some(request_id) = job.request_id.as_deref() {
            if let Ok(value) = HeaderValue::from_str(request_id) {
                headers.insert(REQUEST_ID_HEADER, value);
            }
        }

        self.delivery
            .deliver(&self.config.url, &headers, &gateway_payload(job, delay_secs))
            .await?;

        tracing::debug!(subject_id = %job.subject_id, delay_secs, "Job handed to queue gateway");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LocalDelayQueue
// ---------------------------------------------------------------------------

/// In-process delay queue backed by detached tokio tasks.
///
/// [`LocalDelayQueue::shutdown`] cancels every pending job and waits for
/// in-flight callbacks to finish.
pub struct LocalDelayQueue {
    delivery: Arc<WebhookDelivery>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl LocalDelayQueue {
    pub fn new(delivery: WebhookDelivery) -> Self {
        Self {
            delivery: Arc::new(delivery),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Number of jobs waiting or in flight.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Drop all pending jobs and wait for callbacks already being delivered.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("Local delay queue stopped");
    }
}

#[async_trait]
impl JobQueue for LocalDelayQueue {
    async fn enqueue(&self, job: &DelayedJob, delay_secs: u64) -> Result<(), QueueError> {
        if self.cancel.is_cancelled() {
            return Err(QueueError::Closed);
        }

        let headers = job.callback_headers()?;
        let body = job.callback_body();
        let subject_id = job.subject_id;
        let job = job.clone();
        let delivery = Arc::clone(&self.delivery);
        let cancel = self.cancel.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(subject_id = %job.subject_id, "Delayed job dropped on shutdown");
                }
                _ = tokio::time::sleep(Duration::from_secs(delay_secs)) => {
                    match delivery.deliver(&job.callback_url, &headers, &body).await {
                        Ok(()) => tracing::debug!(subject_id = %job.subject_id, "Delayed job fired"),
                        Err(e) => tracing::error!(
                            subject_id = %job.subject_id,
                            error = %e,
                            "Delayed job callback failed"
                        ),
                    }
                }
            }
        });

        tracing::debug!(subject_id = %subject_id, delay_secs, "Job scheduled in-process");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
