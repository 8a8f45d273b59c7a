//! Email notification delivery via SMTP.
//!
//! [`EmailNotifier`] wraps the `lettre` async SMTP transport to send
//! plain-text upload notifications. Configuration is loaded from environment
//! variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns
//! `None` and the caller should fall back to [`crate::LogNotifier`].

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::notifier::{Notifier, NotifyError};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@syllabi.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured.
    ///
    /// | Variable        | Required | Default                 |
    /// |-----------------|----------|-------------------------|
    /// | `SMTP_HOST`     | yes      |                         |
    /// | `SMTP_PORT`     | no       | `587`                   |
    /// | `SMTP_FROM`     | no       | `noreply@syllabi.local` |
    /// | `SMTP_USER`     | no       |                         |
    /// | `SMTP_PASSWORD` | no       |                         |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Message content
// ---------------------------------------------------------------------------

fn missing_message(name: &str, course_label: &str) -> (String, String) {
    (
        format!("Your {course_label} syllabus upload did not complete"),
        format!(
            "Hi {name},\n\n\
             We did not receive your upload file for {course_label}, so the \
             submission has been removed. You are welcome to submit it again.\n"
        ),
    )
}

fn received_message(name: &str, course_label: &str) -> (String, String) {
    (
        format!("Your {course_label} syllabus is live"),
        format!(
            "Hi {name},\n\n\
             Thanks for sharing! Your syllabus for {course_label} was received \
             and is now visible to other students.\n"
        ),
    )
}

// ---------------------------------------------------------------------------
// EmailNotifier
// ---------------------------------------------------------------------------

/// Sends upload notifications via SMTP.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    async fn send(&self, to_email: &str, subject: String, body: String) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(to = to_email, "Notification email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify_upload_missing(
        &self,
        email: &str,
        name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError> {
        let (subject, body) = missing_message(name, course_label);
        Ok(self.send(email, subject, body).await?)
    }

    async fn notify_upload_received(
        &self,
        email: &str,
        name: &str,
        course_label: &str,
    ) -> Result<(), NotifyError> {
        let (subject, body) = received_message(name, course_label);
        Ok(self.send(email, subject, body).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
