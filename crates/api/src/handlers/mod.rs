pub mod reaction;
pub mod syllabus;
pub mod verification;

use syllabi_core::ids::parse_id;
use syllabi_core::types::DbId;

use crate::error::AppResult;

/// Header carrying presigned storage URLs on intake and read responses.
pub const PRESIGNED_URL_HEADER: &str = "x-presigned-url";

/// Parse a `{id}` path segment naming a syllabus.
pub(crate) fn syllabus_id(raw: &str) -> AppResult<DbId> {
    Ok(parse_id("syllabus", raw)?)
}
