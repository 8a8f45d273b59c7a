//! Parsing of opaque identifiers received from callers.
//!
//! Every id that crosses the HTTP boundary is a string. It is validated into
//! a [`DbId`] before any query runs, so a malformed id is rejected up front
//! instead of surfacing as a database cast error.

use crate::error::CoreError;
use crate::types::DbId;

/// Parse `raw` into a [`DbId`], naming `entity` in the error message.
pub fn parse_id(entity: &'static str, raw: &str) -> Result<DbId, CoreError> {
    DbId::parse_str(raw.trim())
        .map_err(|_| CoreError::Malformed(format!("Invalid {entity} id '{raw}'")))
}

/// Parse an optional filter id. Empty strings are treated as "no filter".
pub fn parse_optional_id(
    entity: &'static str,
    raw: Option<&str>,
) -> Result<Option<DbId>, CoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(entity, value).map(Some),
    }
}
