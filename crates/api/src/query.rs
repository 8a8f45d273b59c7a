//! Query parameter types for API handlers.
//!
//! Values arrive as raw strings and are interpreted leniently: a bad `page`,
//! `size` or `year` falls back to its default instead of failing the request.
//! Bad ids are the exception and are rejected as malformed.

use serde::Deserialize;
use syllabi_core::error::CoreError;
use syllabi_core::ids::parse_optional_id;
use syllabi_core::pagination::Pagination;
use syllabi_core::syllabus::normalize_semester;
use syllabi_db::models::syllabus::SyllabusFilters;

/// Query parameters for `GET /syllabi`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSyllabiParams {
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl ListSyllabiParams {
    pub fn filters(&self) -> Result<SyllabusFilters, CoreError> {
        let semester = self
            .semester
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            // Unknown semesters are kept verbatim and simply match nothing.
            .map(|s| normalize_semester(s).map(str::to_string).unwrap_or_else(|| s.to_string()));

        Ok(SyllabusFilters {
            user_id: parse_optional_id("user", self.user_id.as_deref())?,
            course_id: parse_optional_id("course", self.course_id.as_deref())?,
            year: self.year.as_deref().and_then(|y| y.trim().parse().ok()),
            semester,
        })
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::from_raw(self.page.as_deref(), self.size.as_deref())
    }
}
