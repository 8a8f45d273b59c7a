//! Syllabus reaction (like / dislike) model.

use serde::Serialize;
use sqlx::FromRow;
use syllabi_core::types::{DbId, Timestamp};

/// A row from the `syllabus_reactions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SyllabusReaction {
    pub syllabus_id: DbId,
    pub user_id: DbId,
    pub is_dislike: bool,
    pub date_added: Timestamp,
}
