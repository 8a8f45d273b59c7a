//! Repository for the `syllabi` table.
//!
//! Owner-gated mutations use a single `UPDATE/DELETE ... RETURNING user_id`
//! inside a transaction: the ownership comparison happens on the row that was
//! actually mutated, and a mismatch rolls the mutation back. There is never a
//! separate read before the write.

use sqlx::{PgPool, Postgres, QueryBuilder};
use syllabi_core::pagination::Pagination;
use syllabi_core::types::{DbId, Timestamp};

use crate::error::{StoreError, StoreResult};
use crate::models::syllabus::{
    CreateSyllabus, Syllabus, SyllabusFilters, UpdateSyllabus, VerificationOutcome,
};
use crate::repositories::SyllabusViewRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, course_id, file, file_size, content_type, \
    year, semester, date_added, date_modified, date_synced";

/// Visible to everyone once confirmed, otherwise only to the owner.
const VISIBLE_TO: &str = "(date_synced IS NOT NULL OR user_id = ";

const ENTITY: &str = "syllabus";

/// Row read by [`SyllabusRepo::verify`] before deciding the outcome.
#[derive(sqlx::FromRow)]
struct VerifyRow {
    date_synced: Option<Timestamp>,
    owner_email: String,
    owner_name: String,
    course_code: String,
    course_title: String,
}

/// Row returned by [`SyllabusRepo::expire_unconfirmed`].
#[derive(sqlx::FromRow)]
struct ExpiredRow {
    id: DbId,
    owner_email: String,
    owner_name: String,
    course_code: String,
    course_title: String,
}

/// Provides lifecycle operations for syllabi.
pub struct SyllabusRepo;

impl SyllabusRepo {
    // ── Intake ───────────────────────────────────────────────────────

    /// Insert a new unconfirmed syllabus and return its generated id.
    ///
    /// Constraint violations (unknown course or user, out-of-range year,
    /// unknown semester, ...) are reported as [`StoreError::Malformed`].
    pub async fn create(pool: &PgPool, input: &CreateSyllabus) -> StoreResult<DbId> {
        let mut tx = pool.begin().await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO syllabi
                (user_id, course_id, file, file_size, content_type, year, semester)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.course_id)
        .bind(&input.file)
        .bind(input.file_size)
        .bind(&input.content_type)
        .bind(input.year)
        .bind(&input.semester)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::classify)?;

        tx.commit().await?;
        tracing::debug!(syllabus_id = %id, user_id = %input.user_id, "Syllabus row created");
        Ok(id)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch a syllabus the requester may see and record the view, atomically.
    ///
    /// Private (unconfirmed, not owned) and missing rows both yield
    /// [`StoreError::NotFound`].
    pub async fn get_visible(pool: &PgPool, requester: DbId, id: DbId) -> StoreResult<Syllabus> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM syllabi WHERE id = $1 AND {VISIBLE_TO}$2)");
        let syllabus = sqlx::query_as::<_, Syllabus>(&query)
            .bind(id)
            .bind(requester)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::not_found(ENTITY, id))?;

        SyllabusViewRepo::mark_viewed(&mut *tx, id, requester).await?;

        tx.commit().await?;
        Ok(syllabus)
    }

    /// List syllabi visible to `requester`, newest first.
    pub async fn list(
        pool: &PgPool,
        requester: DbId,
        filters: &SyllabusFilters,
        page: Pagination,
    ) -> StoreResult<Vec<Syllabus>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM syllabi WHERE {VISIBLE_TO}"));
        qb.push_bind(requester).push(")");

        if let Some(user_id) = filters.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(course_id) = filters.course_id {
            qb.push(" AND course_id = ").push_bind(course_id);
        }
        if let Some(year) = filters.year {
            qb.push(" AND year = ").push_bind(year);
        }
        if let Some(semester) = &filters.semester {
            qb.push(" AND semester = ").push_bind(semester.clone());
        }

        qb.push(" ORDER BY date_added DESC, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Syllabus>().fetch_all(pool).await?;
        Ok(rows)
    }

    // ── Owner-gated mutations ────────────────────────────────────────

    /// Update year and/or semester. Only the owner may update.
    pub async fn update(
        pool: &PgPool,
        requester: DbId,
        id: DbId,
        input: &UpdateSyllabus,
    ) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        let owner: Option<DbId> = sqlx::query_scalar(
            "UPDATE syllabi SET
                year = COALESCE($2, year),
                semester = COALESCE($3, semester),
                date_modified = NOW()
             WHERE id = $1
             RETURNING user_id",
        )
        .bind(id)
        .bind(input.year)
        .bind(input.semester.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::classify)?;

        match owner {
            None => Err(StoreError::not_found(ENTITY, id)),
            Some(owner) if owner != requester => {
                tx.rollback().await?;
                tracing::info!(
                    syllabus_id = %id,
                    user_id = %requester,
                    owner_id = %owner,
                    "Rejected syllabus update by non-owner",
                );
                Err(StoreError::Forbidden(
                    "You do not have access to update this syllabus".into(),
                ))
            }
            Some(_) => {
                tx.commit().await?;
                Ok(())
            }
        }
    }

    /// Delete a syllabus. Only the owner may delete.
    pub async fn delete(pool: &PgPool, requester: DbId, id: DbId) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        let owner: Option<DbId> =
            sqlx::query_scalar("DELETE FROM syllabi WHERE id = $1 RETURNING user_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match owner {
            None => Err(StoreError::not_found(ENTITY, id)),
            Some(owner) if owner != requester => {
                tx.rollback().await?;
                tracing::info!(
                    syllabus_id = %id,
                    user_id = %requester,
                    owner_id = %owner,
                    "Rejected syllabus delete by non-owner",
                );
                Err(StoreError::Forbidden(
                    "You do not have access to delete this syllabus".into(),
                ))
            }
            Some(_) => {
                tx.commit().await?;
                Ok(())
            }
        }
    }

    // ── Upload confirmation ──────────────────────────────────────────

    /// Mark the upload as received. Re-confirming keeps the first timestamp.
    ///
    /// Returns the confirmation time.
    pub async fn sync(pool: &PgPool, id: DbId) -> StoreResult<Timestamp> {
        let mut tx = pool.begin().await?;

        let synced_at: Option<Timestamp> = sqlx::query_scalar(
            "UPDATE syllabi SET date_synced = COALESCE(date_synced, NOW())
             WHERE id = $1
             RETURNING date_synced",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let synced_at = synced_at.ok_or(StoreError::not_found(ENTITY, id))?;
        tx.commit().await?;
        Ok(synced_at)
    }

    /// Keep a confirmed syllabus or delete one that was never confirmed.
    ///
    /// A kept row is stamped with `date_verified` the first time only, and
    /// `newly_verified` reports whether this call did the stamping.
    ///
    /// The row is locked for the duration of the transaction, so a concurrent
    /// [`SyllabusRepo::sync`] either lands before the read (row kept) or
    /// blocks until the delete commits (and then finds nothing).
    pub async fn verify(pool: &PgPool, id: DbId) -> StoreResult<VerificationOutcome> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query_as::<_, VerifyRow>(
            "SELECT s.date_synced,
                    u.email AS owner_email,
                    u.full_name AS owner_name,
                    c.course AS course_code,
                    c.title AS course_title
             FROM syllabi s
             JOIN users u ON u.id = s.user_id
             JOIN courses c ON c.id = s.course_id
             WHERE s.id = $1
             FOR UPDATE OF s",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::not_found(ENTITY, id))?;

        let was_confirmed = row.date_synced.is_some();
        let newly_verified = if was_confirmed {
            sqlx::query(
                "UPDATE syllabi SET date_verified = NOW()
                 WHERE id = $1 AND date_verified IS NULL",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                > 0
        } else {
            sqlx::query("DELETE FROM syllabi WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            false
        };

        tx.commit().await?;

        Ok(VerificationOutcome {
            syllabus_id: id,
            was_confirmed,
            newly_verified,
            owner_email: row.owner_email,
            owner_name: row.owner_name,
            course_code: row.course_code,
            course_title: row.course_title,
        })
    }

    /// Delete unconfirmed syllabi added before `cutoff`.
    ///
    /// Covers uploads whose verification job was never scheduled. Returns
    /// one outcome per deleted row so the owners can be told.
    pub async fn expire_unconfirmed(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> StoreResult<Vec<VerificationOutcome>> {
        let rows = sqlx::query_as::<_, ExpiredRow>(
            "DELETE FROM syllabi s
             USING users u, courses c
             WHERE u.id = s.user_id
               AND c.id = s.course_id
               AND s.date_synced IS NULL
               AND s.date_added < $1
             RETURNING s.id,
                       u.email AS owner_email,
                       u.full_name AS owner_name,
                       c.course AS course_code,
                       c.title AS course_title",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| VerificationOutcome {
                syllabus_id: row.id,
                was_confirmed: false,
                newly_verified: false,
                owner_email: row.owner_email,
                owner_name: row.owner_name,
                course_code: row.course_code,
                course_title: row.course_title,
            })
            .collect())
    }
}
