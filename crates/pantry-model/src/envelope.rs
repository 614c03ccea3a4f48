//! The uniform response envelope.
//!
//! ```json
//! {
//!   "data": {"id": "..."},
//!   "pagination": null,
//!   "error": null,
//!   "details": {"currentHouseholdID": "...", "traceID": "0af7651916cd43dd8448eb211c80319c"}
//! }
//! ```
//!
//! Exactly one of `data` and `error` is populated; `pagination` accompanies
//! list reads only.

use serde::de::value::SeqDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ErrorCode;
use crate::filter::QueryFilter;

/// Per-request details carried by every envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDetails {
    /// The caller's active household, empty when unauthenticated.
    #[serde(rename = "currentHouseholdID", default)]
    pub current_household_id: String,
    /// Trace ID of the request span, 32 hex characters.
    #[serde(rename = "traceID", default)]
    pub trace_id: String,
}

impl ResponseDetails {
    /// Details for a request that has not resolved a session yet.
    #[must_use]
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            current_household_id: String::new(),
            trace_id: trace_id.into(),
        }
    }
}

/// Position of a list page within the full result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total number of matching records.
    pub total_count: u64,
}

impl Pagination {
    /// Pagination for a page selected by `filter` out of `total_count` records.
    #[must_use]
    pub fn new(filter: &QueryFilter, total_count: u64) -> Self {
        Self {
            page: filter.page,
            limit: filter.limit,
            total_count,
        }
    }
}

/// The client-visible error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Short, safe, human-readable message.
    pub message: String,
    /// Stable error code.
    pub code: ErrorCode,
}

/// The envelope every response body is wrapped in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    /// The payload, `null` on error.
    pub data: Option<T>,
    /// Present for list reads only.
    pub pagination: Option<Pagination>,
    /// Present on error only.
    pub error: Option<ResponseError>,
    /// Trace and household details.
    pub details: ResponseDetails,
}

#[derive(Deserialize)]
struct RawResponse<T> {
    data: Option<T>,
    pagination: Option<Pagination>,
    error: Option<ResponseError>,
    details: ResponseDetails,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ApiResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawResponse::<T>::deserialize(deserializer)?;

        // Formats that spell a list as repeated elements have nothing to
        // write for an empty page; pagination still marks it as a list.
        let data = match (raw.data, raw.pagination) {
            (None, Some(_)) => {
                let empty = SeqDeserializer::<_, D::Error>::new(std::iter::empty::<()>());
                Some(T::deserialize(empty)?)
            }
            (data, _) => data,
        };

        Ok(Self {
            data,
            pagination: raw.pagination,
            error: raw.error,
            details: raw.details,
        })
    }
}

impl<T> ApiResponse<T> {
    /// A success envelope carrying a single value.
    #[must_use]
    pub fn new(data: T, details: ResponseDetails) -> Self {
        Self {
            data: Some(data),
            pagination: None,
            error: None,
            details,
        }
    }

    /// An error envelope.
    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>, details: ResponseDetails) -> Self {
        Self {
            data: None,
            pagination: None,
            error: Some(ResponseError {
                message: message.into(),
                code,
            }),
            details,
        }
    }

    /// Whether this envelope carries an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether exactly one of `data` and `error` is populated.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.data.is_some() != self.error.is_some()
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A success envelope carrying one page of a list.
    #[must_use]
    pub fn list(items: Vec<T>, pagination: Pagination, details: ResponseDetails) -> Self {
        Self {
            data: Some(items),
            pagination: Some(pagination),
            error: None,
            details,
        }
    }
}
