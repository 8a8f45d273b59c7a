//! Offset pagination with lenient parsing.
//!
//! List endpoints never reject a bad `page` or `size`; unparseable or
//! out-of-range values fall back to the defaults below.

/// First page number.
pub const DEFAULT_PAGE: i64 = 1;

/// Rows per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Upper bound on rows per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A validated page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build from raw query-string values.
    pub fn from_raw(page: Option<&str>, size: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let size = parse_positive(size)
            .map(|s| s.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, size }
    }

    /// SQL `LIMIT` value.
    pub fn limit(&self) -> i64 {
        self.size
    }

    /// SQL `OFFSET` value.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
}
