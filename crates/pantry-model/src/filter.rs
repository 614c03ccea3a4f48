//! List query filters parsed from the request's query string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::Pagination;

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 250;

/// Result ordering by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Oldest first.
    #[default]
    Asc,
    /// Newest first.
    Desc,
}

/// Paging and time-window filter for list reads.
///
/// Malformed or out-of-range parameters fall back to their defaults
/// instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// One-based page number.
    pub page: u32,
    /// Page size, at most [`MAX_LIMIT`].
    pub limit: u32,
    /// Ordering by creation time.
    pub sort_by: SortOrder,
    /// Only records created before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Only records created after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Only records updated before this instant.
    pub updated_before: Option<DateTime<Utc>>,
    /// Only records updated after this instant.
    pub updated_after: Option<DateTime<Utc>>,
    /// Whether archived records are included.
    pub include_archived: bool,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            sort_by: SortOrder::Asc,
            created_before: None,
            created_after: None,
            updated_before: None,
            updated_after: None,
            include_archived: false,
        }
    }
}

impl QueryFilter {
    /// Parse a filter from a raw query string such as `page=2&limit=10`.
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let mut filter = Self::default();
        let Some(query) = query else {
            return filter;
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    if let Some(page) = value.parse::<u32>().ok().filter(|p| *p > 0) {
                        filter.page = page;
                    }
                }
                "limit" => {
                    if let Some(limit) = value.parse::<u32>().ok().filter(|l| *l > 0) {
                        filter.limit = limit.min(MAX_LIMIT);
                    }
                }
                "sortBy" => {
                    filter.sort_by = match value.as_ref() {
                        "desc" => SortOrder::Desc,
                        _ => SortOrder::Asc,
                    };
                }
                "createdBefore" => filter.created_before = parse_timestamp(&value),
                "createdAfter" => filter.created_after = parse_timestamp(&value),
                "updatedBefore" => filter.updated_before = parse_timestamp(&value),
                "updatedAfter" => filter.updated_after = parse_timestamp(&value),
                "includeArchived" => {
                    filter.include_archived = matches!(value.as_ref(), "true" | "1");
                }
                _ => {}
            }
        }

        filter
    }

    /// Number of records skipped before this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }

    /// Whether a record with the given timestamps falls inside the window.
    #[must_use]
    pub fn matches(&self, created_at: DateTime<Utc>, updated_at: Option<DateTime<Utc>>) -> bool {
        if self.created_before.is_some_and(|t| created_at >= t) {
            return false;
        }
        if self.created_after.is_some_and(|t| created_at <= t) {
            return false;
        }
        if let Some(updated_at) = updated_at {
            if self.updated_before.is_some_and(|t| updated_at >= t) {
                return false;
            }
            if self.updated_after.is_some_and(|t| updated_at <= t) {
                return false;
            }
        }
        true
    }

    /// Select this filter's page out of `items`.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> QueryFilteredResult<T> {
        let total_count = items.len() as u64;
        let data = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .collect();
        QueryFilteredResult {
            data,
            pagination: Pagination::new(self, total_count),
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// One page of a filtered list read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilteredResult<T> {
    /// Records on this page.
    pub data: Vec<T>,
    /// Position of this page.
    pub pagination: Pagination,
}

impl<T> QueryFilteredResult<T> {
    /// An empty page for `filter`.
    #[must_use]
    pub fn empty(filter: &QueryFilter) -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination::new(filter, 0),
        }
    }
}
