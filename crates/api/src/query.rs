//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Page size used when `limit` is absent, unparsable or negative.
pub const DEFAULT_LIMIT: i64 = 50;
/// Offset used when `offset` is absent, unparsable or negative.
pub const DEFAULT_OFFSET: i64 = 0;

/// Pagination parameters (`?limit=&offset=`).
///
/// Kept as raw strings so a malformed value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        parse_non_negative(self.limit.as_deref(), DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        parse_non_negative(self.offset.as_deref(), DEFAULT_OFFSET)
    }
}

fn parse_non_negative(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .unwrap_or(default)
}
