/// Errors raised before any query runs: bad input and rejected credentials.
///
/// Store-level outcomes (missing rows, ownership, races) are reported by
/// `syllabi_db::error::StoreError` instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}
