//! Repository for the `syllabus_reactions` table.
//!
//! A reaction is replaced by deleting the old row and inserting a new one in
//! the same transaction, so `date_added` always reflects the latest reaction.
//! Two concurrent replacements for the same user and syllabus can both pass
//! the delete; the second insert then trips `uq_syllabus_reactions_syllabus_user`
//! and is reported as [`StoreError::Conflict`] for the caller to retry.

use sqlx::PgPool;
use syllabi_core::types::DbId;

use crate::error::{StoreError, StoreResult};
use crate::models::reaction::SyllabusReaction;

/// Provides the like/dislike toggle.
pub struct ReactionRepo;

impl ReactionRepo {
    /// Replace the user's reaction to a syllabus.
    pub async fn set(
        pool: &PgPool,
        user_id: DbId,
        syllabus_id: DbId,
        is_dislike: bool,
    ) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM syllabus_reactions WHERE syllabus_id = $1 AND user_id = $2")
            .bind(syllabus_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO syllabus_reactions (syllabus_id, user_id, is_dislike) VALUES ($1, $2, $3)",
        )
        .bind(syllabus_id)
        .bind(user_id)
        .bind(is_dislike)
        .execute(&mut *tx)
        .await
        .map_err(|e| match StoreError::classify(e) {
            StoreError::Conflict(detail) => {
                tracing::warn!(
                    syllabus_id = %syllabus_id,
                    user_id = %user_id,
                    "Concurrent reaction write detected",
                );
                StoreError::Conflict(detail)
            }
            other => other,
        })?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove the user's reaction. Returns `true` if a reaction existed.
    pub async fn remove(pool: &PgPool, user_id: DbId, syllabus_id: DbId) -> StoreResult<bool> {
        let mut tx = pool.begin().await?;

        let result =
            sqlx::query("DELETE FROM syllabus_reactions WHERE syllabus_id = $1 AND user_id = $2")
                .bind(syllabus_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// List every reaction to a syllabus, oldest first.
    pub async fn list_for_syllabus(
        pool: &PgPool,
        syllabus_id: DbId,
    ) -> StoreResult<Vec<SyllabusReaction>> {
        let rows = sqlx::query_as::<_, SyllabusReaction>(
            "SELECT syllabus_id, user_id, is_dislike, date_added FROM syllabus_reactions \
             WHERE syllabus_id = $1 ORDER BY date_added, user_id",
        )
        .bind(syllabus_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
