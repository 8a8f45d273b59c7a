//! Syllabus entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use syllabi_core::types::{DbId, Timestamp};
use syllabi_core::upload::UploadState;

/// A row from the `syllabi` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Syllabus {
    pub id: DbId,
    pub user_id: DbId,
    pub course_id: DbId,
    pub file: String,
    pub file_size: i32,
    pub content_type: String,
    pub year: i16,
    pub semester: String,
    pub date_added: Timestamp,
    pub date_modified: Timestamp,
    pub date_synced: Option<Timestamp>,
}

impl Syllabus {
    pub fn state(&self) -> UploadState {
        UploadState::from_synced_at(self.date_synced)
    }

    pub fn is_confirmed(&self) -> bool {
        self.state() == UploadState::Confirmed
    }
}

/// DTO for inserting a new, unconfirmed syllabus.
#[derive(Debug, Clone)]
pub struct CreateSyllabus {
    pub user_id: DbId,
    pub course_id: DbId,
    pub file: String,
    pub file_size: i32,
    pub content_type: String,
    pub year: i16,
    pub semester: String,
}

/// DTO for the owner-editable fields. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSyllabus {
    pub year: Option<i16>,
    pub semester: Option<String>,
}

/// Optional narrowing applied on top of the visibility predicate.
#[derive(Debug, Clone, Default)]
pub struct SyllabusFilters {
    pub user_id: Option<DbId>,
    pub course_id: Option<DbId>,
    pub year: Option<i16>,
    pub semester: Option<String>,
}

/// Result of the verification step, with the owner/course details needed to
/// notify the uploader.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub syllabus_id: DbId,
    /// `true` if the upload had been confirmed and the row was kept.
    pub was_confirmed: bool,
    /// `true` only for the verification that first found the row confirmed.
    /// Redelivered jobs see `false`.
    pub newly_verified: bool,
    pub owner_email: String,
    pub owner_name: String,
    pub course_code: String,
    pub course_title: String,
}

impl VerificationOutcome {
    /// Human-readable course label, e.g. `"CPS 109 - Computer Science I"`.
    pub fn course_label(&self) -> String {
        format!("{} - {}", self.course_code, self.course_title)
    }
}
