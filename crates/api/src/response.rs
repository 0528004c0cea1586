//! Shared response body types for API handlers.

use serde::Serialize;

/// Body of a successful update or delete.
pub const DONE: &str = "DONE";

/// Paginated list envelope: `{ "count", "offset", "limit", "data" }`.
///
/// `count` is the number of records in this page, not the table total.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub count: usize,
    pub offset: i64,
    pub limit: i64,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, offset: i64, limit: i64) -> Self {
        Self {
            count: data.len(),
            offset,
            limit,
            data,
        }
    }
}
