//! Uploader notifications.

use async_trait::async_trait;

use crate::delivery::email::EmailError;

/// Error type for notification failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Tells an uploader how their upload ended.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The file never reached storage and the syllabus was removed.
    async fn notify_upload_missing(
        &self,
        email: &str,
        name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError>;

    /// The file reached storage and the syllabus is now public.
    async fn notify_upload_received(
        &self,
        email: &str,
        name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError>;
}

/// Notifier used when SMTP is not configured. Writes one log line per
/// notification and never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_upload_missing(
        &self,
        email: &str,
        name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(to = email, name, course = course_label, "Upload missing notification (log only)");
        Ok(())
    }

    async fn notify_upload_received(
        &self,
        email: &str,
        name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(to = email, name, course = course_label, "Upload received notification (log only)");
        Ok(())
    }
}
