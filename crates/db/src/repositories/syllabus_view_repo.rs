//! Repository for the `syllabus_views` table.

use sqlx::{PgConnection, PgPool};
use syllabi_core::types::DbId;

/// Records deduplicated "user viewed syllabus" facts.
pub struct SyllabusViewRepo;

impl SyllabusViewRepo {
    /// Record that `user_id` viewed `syllabus_id`.
    ///
    /// Runs on the caller's connection so it commits or rolls back together
    /// with the read that made the syllabus visible. Returns `true` when this
    /// is the user's first view; repeat views are silently ignored.
    pub async fn mark_viewed(
        conn: &mut PgConnection,
        syllabus_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO syllabus_views (syllabus_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (syllabus_id, user_id) DO NOTHING",
        )
        .bind(syllabus_id)
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of distinct users who have viewed a syllabus.
    pub async fn count_for_syllabus(pool: &PgPool, syllabus_id: DbId) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM syllabus_views WHERE syllabus_id = $1")
                .bind(syllabus_id)
                .fetch_one(pool)
                .await?;
        Ok(count.0)
    }
}
