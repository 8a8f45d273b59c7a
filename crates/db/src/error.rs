//! Typed error kinds returned by the repositories.

use syllabi_core::types::DbId;

/// PostgreSQL SQLSTATE codes that mean the caller sent bad data.
const MALFORMED_SQLSTATES: &[&str] = &[
    "23503", // foreign_key_violation
    "23514", // check_violation
    "23502", // not_null_violation
    "22P02", // invalid_text_representation
    "22001", // string_data_right_truncation
    "22003", // numeric_value_out_of_range
    "22007", // invalid_datetime_format
];

/// PostgreSQL unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Repository operation errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Input failed a database constraint (bad reference, domain check, ...).
    #[error("malformed input: {0}")]
    Malformed(String),

    /// No row matched, or the row is not visible to the requester.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The row exists but belongs to someone else.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A concurrent write hit a uniqueness constraint. Safe to retry.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Map a write error onto the taxonomy: constraint failures become
    /// [`StoreError::Malformed`], unique violations [`StoreError::Conflict`],
    /// everything else stays a [`StoreError::Database`] error.
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                let detail = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                if code == UNIQUE_VIOLATION {
                    return Self::Conflict(detail);
                }
                if MALFORMED_SQLSTATES.contains(&code.as_ref()) {
                    return Self::Malformed(detail);
                }
            }
        }
        Self::Database(err)
    }

    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::NotFound { entity, id }
    }
}
