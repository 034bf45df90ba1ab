//! Pagination types for list endpoints.
//!
//! List endpoints page with `limit`/`offset`. Values arriving from query
//! strings are parsed leniently: anything malformed or out of range falls
//! back to the default instead of failing the request.

use serde::{Deserialize, Serialize};

use super::query::parse_in_range;

/// Default number of items per page.
pub const DEFAULT_LIMIT: u64 = 100;

/// Largest page size a caller may request.
pub const MAX_LIMIT: u64 = 500;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of items to return.
    pub limit: u64,
    /// Number of items to skip.
    pub offset: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Builds a page request from raw query-string values.
    #[must_use]
    pub fn from_query(limit: Option<&str>, offset: Option<&str>) -> Self {
        Self::from_query_with_default(limit, offset, DEFAULT_LIMIT)
    }

    /// Like [`PageRequest::from_query`] with a caller-chosen default limit.
    #[must_use]
    pub fn from_query_with_default(
        limit: Option<&str>,
        offset: Option<&str>,
        default_limit: u64,
    ) -> Self {
        Self {
            limit: parse_in_range(limit, 1..=MAX_LIMIT, default_limit),
            offset: parse_in_range(offset, 0..=u64::from(u32::MAX), 0),
        }
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Page size used for this query.
    pub limit: u64,
    /// Offset used for this query.
    pub offset: u64,
    /// Total number of items matching the query.
    pub total: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, page: PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta {
                limit: page.limit,
                offset: page.offset,
                total,
            },
        }
    }

    /// Maps the items while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
