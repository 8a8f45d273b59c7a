//! Syllabus upload rules: accepted semesters, year bounds, reaction kinds
//! and validation of the intake / update payloads.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Semesters accepted by the `syllabi.semester` check constraint.
pub const SEMESTERS: &[&str] = &["Fall", "Winter", "Spring", "Summer"];

/// Earliest academic year accepted.
pub const MIN_YEAR: i16 = 1900;

/// Latest academic year accepted.
pub const MAX_YEAR: i16 = 9999;

/// Largest accepted upload (50 MiB).
pub const MAX_FILE_SIZE: i32 = 50 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Semester
// ---------------------------------------------------------------------------

/// Normalise a semester to its canonical capitalisation (`"fall"` -> `"Fall"`).
///
/// Returns `None` when the value is not one of [`SEMESTERS`].
pub fn normalize_semester(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    SEMESTERS
        .iter()
        .copied()
        .find(|s| s.eq_ignore_ascii_case(trimmed))
}

fn validate_semester(value: &str) -> Result<(), ValidationError> {
    if normalize_semester(value).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("semester")
            .with_message(format!("semester must be one of {SEMESTERS:?}").into()))
    }
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// A user's reaction to a syllabus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    /// Parse the `action` field of a reaction request.
    pub fn parse(action: &str) -> Result<Self, CoreError> {
        match action.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(CoreError::Malformed(format!(
                "Unknown reaction '{other}'. Expected 'like' or 'dislike'"
            ))),
        }
    }

    pub fn is_dislike(self) -> bool {
        matches!(self, Self::Dislike)
    }
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Body of `POST /syllabi`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub course_id: String,
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(range(min = 1, max = MAX_FILE_SIZE))]
    pub file_size: i32,
    #[validate(length(min = 1, max = 255))]
    pub content_type: String,
    /// Base64 CRC32 of the file, enforced by object storage on upload.
    #[validate(length(min = 1, max = 64))]
    pub checksum: String,
    #[validate(range(min = MIN_YEAR, max = MAX_YEAR))]
    pub year: i16,
    #[validate(custom(function = "validate_semester"))]
    pub semester: String,
}

/// Body of `PATCH /syllabi/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[validate(range(min = MIN_YEAR, max = MAX_YEAR))]
    pub year: Option<i16>,
    #[validate(custom(function = "validate_semester"))]
    pub semester: Option<String>,
}

/// Run `validator` rules and fold failures into [`CoreError::Malformed`].
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), CoreError> {
    payload
        .validate()
        .map_err(|errors| CoreError::Malformed(errors.to_string()))
}
