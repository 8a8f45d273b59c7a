//! Upload confirmation lifecycle and timing policy.
//!
//! A syllabus starts [`UploadState::Unconfirmed`] when its row is created and
//! becomes [`UploadState::Confirmed`] once object storage reports the file.
//! One delayed verification job fires after [`UploadTiming::verification_delay_secs`];
//! if the row is still unconfirmed at that point it is deleted.
//!
//! The presigned upload URL expires `grace` seconds before the job fires, so an
//! upload can never begin after its verification has already run.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Deployment environment, selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(CoreError::Malformed(format!(
                "Unknown environment '{other}'. Expected 'development' or 'production'"
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Upload URL lifetime and verification slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTiming {
    /// Lifetime of the presigned upload URL.
    pub upload_url_ttl_secs: u64,
    /// Extra time after the URL expires for an in-flight upload to land.
    pub verify_grace_secs: u64,
}

impl UploadTiming {
    /// Short timings for local feedback loops, multi-minute ones in production.
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                upload_url_ttl_secs: 30,
                verify_grace_secs: 5,
            },
            Environment::Production => Self {
                upload_url_ttl_secs: 300,
                verify_grace_secs: 60,
            },
        }
    }

    /// Delay before the verification job fires.
    pub fn verification_delay_secs(&self) -> u64 {
        self.upload_url_ttl_secs + self.verify_grace_secs
    }

    /// Age after which a still-unconfirmed upload is swept. Twice the
    /// verification delay, so the scheduled job always gets to decide first.
    pub fn unconfirmed_expiry_secs(&self) -> u64 {
        self.verification_delay_secs().saturating_mul(2)
    }
}

/// Confirmation state derived from the nullable `date_synced` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Unconfirmed,
    Confirmed,
}

impl UploadState {
    pub fn from_synced_at(synced_at: Option<Timestamp>) -> Self {
        match synced_at {
            Some(_) => Self::Confirmed,
            None => Self::Unconfirmed,
        }
    }
}
