//! Drives a syllabus through intake, confirmation and verification.
//!
//! ```text
//! UNCONFIRMED --(confirm)--------------------> CONFIRMED
//! UNCONFIRMED --(verify while unconfirmed)---> DELETED
//! ```
//!
//! Intake schedules exactly one verification job. If scheduling fails the
//! row is left unconfirmed and private until [`UploadOrchestrator::sweep_unconfirmed`]
//! removes it once it is older than twice the verification delay.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use syllabi_cloud::Presigner;
use syllabi_core::error::CoreError;
use syllabi_core::ids::parse_id;
use syllabi_core::syllabus::{normalize_semester, validate_payload, UploadRequest};
use syllabi_core::types::{DbId, Timestamp};
use syllabi_db::models::syllabus::{CreateSyllabus, VerificationOutcome};
use syllabi_db::repositories::SyllabusRepo;
use syllabi_db::DbPool;
use syllabi_events::{DelayedJob, JobQueue, Notifier};

use crate::auth::jwt::generate_service_token;
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::request::RequestContext;

/// What the client needs to finish an upload.
#[derive(Debug, Clone)]
pub struct IntakeReceipt {
    pub syllabus_id: DbId,
    /// Presigned PUT URL for the file body.
    pub upload_url: String,
}

/// Callback URL the delayed job POSTs to.
pub fn verify_callback_url(public_url: &str, id: DbId) -> String {
    format!("{}/api/v1/syllabi/{id}/verify", public_url.trim_end_matches('/'))
}

/// Coordinates the store with the storage signer, job queue and notifier.
pub struct UploadOrchestrator {
    pool: DbPool,
    config: Arc<ServerConfig>,
    presigner: Arc<dyn Presigner>,
    queue: Arc<dyn JobQueue>,
    notifier: Arc<dyn Notifier>,
}

impl UploadOrchestrator {
    pub fn new(
        pool: DbPool,
        config: Arc<ServerConfig>,
        presigner: Arc<dyn Presigner>,
        queue: Arc<dyn JobQueue>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pool,
            config,
            presigner,
            queue,
            notifier,
        }
    }

    // ── Intake ───────────────────────────────────────────────────────

    /// Create an unconfirmed syllabus, presign its upload URL and schedule
    /// its verification.
    pub async fn intake(
        &self,
        ctx: &RequestContext,
        input: UploadRequest,
    ) -> AppResult<IntakeReceipt> {
        validate_payload(&input)?;
        let course_id = parse_id("course", &input.course_id)?;
        let semester = normalize_semester(&input.semester)
            .ok_or_else(|| CoreError::Malformed(format!("Unknown semester '{}'", input.semester)))?;

        let syllabus_id = SyllabusRepo::create(
            &self.pool,
            &CreateSyllabus {
                user_id: ctx.user.user_id,
                course_id,
                file: input.file_name.trim().to_string(),
                file_size: input.file_size,
                content_type: input.content_type.clone(),
                year: input.year,
                semester: semester.to_string(),
            },
        )
        .await?;

        let upload_url = self
            .presigner
            .presign_upload(
                &syllabus_id.to_string(),
                &input.content_type,
                &input.checksum,
                self.config.upload.upload_url_ttl_secs,
            )
            .await
            .map_err(|e| {
                AppError::InternalError(format!(
                    "Failed to presign upload for syllabus {syllabus_id}: {e}"
                ))
            })?;

        self.schedule_verification(ctx, syllabus_id).await;

        tracing::info!(
            syllabus_id = %syllabus_id,
            user_id = %ctx.user.user_id,
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            "Syllabus intake accepted",
        );

        Ok(IntakeReceipt {
            syllabus_id,
            upload_url,
        })
    }

    /// Enqueue the single verification job. Failures are logged only.
    async fn schedule_verification(&self, ctx: &RequestContext, syllabus_id: DbId) {
        let token = match generate_service_token(&self.config.jwt) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(syllabus_id = %syllabus_id, error = %e, "Failed to mint service token");
                return;
            }
        };

        let job = DelayedJob {
            subject_id: syllabus_id,
            callback_url: verify_callback_url(&self.config.public_url, syllabus_id),
            auth_header: format!("Bearer {token}"),
            request_id: ctx.request_id.clone(),
        };
        let delay_secs = self.config.upload.verification_delay_secs();

        if let Err(e) = self.queue.enqueue(&job, delay_secs).await {
            tracing::error!(
                syllabus_id = %syllabus_id,
                request_id = ctx.request_id.as_deref().unwrap_or("-"),
                error = %e,
                "Failed to schedule verification; upload stays unconfirmed",
            );
        }
    }

    // ── Confirmation ─────────────────────────────────────────────────

    /// Record that object storage received the file. Idempotent.
    pub async fn confirm(&self, syllabus_id: DbId) -> AppResult<Timestamp> {
        let synced_at = SyllabusRepo::sync(&self.pool, syllabus_id).await?;
        tracing::info!(syllabus_id = %syllabus_id, synced_at = %synced_at, "Syllabus upload confirmed");
        Ok(synced_at)
    }

    // ── Verification ─────────────────────────────────────────────────

    /// Keep a confirmed syllabus or delete an abandoned one, then tell the
    /// owner which happened.
    pub async fn verify(
        &self,
        syllabus_id: DbId,
        request_id: Option<&str>,
    ) -> AppResult<VerificationOutcome> {
        let outcome = SyllabusRepo::verify(&self.pool, syllabus_id).await?;

        match (outcome.was_confirmed, outcome.newly_verified) {
            (true, true) => {
                tracing::info!(syllabus_id = %syllabus_id, request_id, "Syllabus verified");
                self.notify(&outcome).await;
            }
            (true, false) => {
                tracing::debug!(syllabus_id = %syllabus_id, request_id, "Syllabus already verified");
            }
            (false, _) => {
                tracing::info!(syllabus_id = %syllabus_id, request_id, "Syllabus never uploaded, removed");
                self.notify(&outcome).await;
            }
        }

        Ok(outcome)
    }

    // ── Expiry ───────────────────────────────────────────────────────

    /// Delete unconfirmed uploads whose verification never ran and tell each
    /// owner. Returns how many were removed.
    pub async fn sweep_unconfirmed(&self) -> AppResult<usize> {
        let age_secs = self.config.upload.unconfirmed_expiry_secs();
        let max_age = chrono::Duration::from_std(Duration::from_secs(age_secs))
            .map_err(|e| AppError::InternalError(format!("Expiry age {age_secs}s out of range: {e}")))?;
        let cutoff = Utc::now() - max_age;

        let expired = SyllabusRepo::expire_unconfirmed(&self.pool, cutoff).await?;
        for outcome in &expired {
            tracing::info!(syllabus_id = %outcome.syllabus_id, "Stale unconfirmed syllabus removed");
            self.notify(outcome).await;
        }
        Ok(expired.len())
    }

    async fn notify(&self, outcome: &VerificationOutcome) {
        let course = outcome.course_label();
        let result = if outcome.was_confirmed {
            self.notifier
                .notify_upload_received(&outcome.owner_email, &outcome.owner_name, &course)
                .await
        } else {
            self.notifier
                .notify_upload_missing(&outcome.owner_email, &outcome.owner_name, &course)
                .await
        };

        if let Err(e) = result {
            tracing::warn!(
                syllabus_id = %outcome.syllabus_id,
                error = %e,
                "Failed to notify uploader",
            );
        }
    }
}
