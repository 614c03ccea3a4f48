//! Service error taxonomy.
//!
//! Handlers never leak internal error text to clients: a [`ServiceError`]
//! carries a client-safe message and a stable [`ErrorCode`], and keeps the
//! underlying cause in `source` for logs and traces only.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Stable, machine-readable error codes surfaced in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// No session could be resolved.
    Unauthenticated,
    /// The session lacks the required permission.
    Forbidden,
    /// The request body could not be decoded, or named something unknown.
    InvalidRequestInput,
    /// The request decoded but failed validation.
    ValidationError,
    /// The addressed resource does not exist.
    NotFound,
    /// The data layer failed.
    DatabaseError,
    /// A message could not be handed to the message bus.
    PublishFailure,
    /// Anything else.
    #[default]
    Internal,
}

impl ErrorCode {
    /// All known codes.
    pub const ALL: [Self; 8] = [
        Self::Unauthenticated,
        Self::Forbidden,
        Self::InvalidRequestInput,
        Self::ValidationError,
        Self::NotFound,
        Self::DatabaseError,
        Self::PublishFailure,
        Self::Internal,
    ];

    /// Returns the wire form of the code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::InvalidRequestInput => "invalid_request_input",
            Self::ValidationError => "validation_error",
            Self::NotFound => "not_found",
            Self::DatabaseError => "database_error",
            Self::PublishFailure => "publish_failure",
            Self::Internal => "internal",
        }
    }

    /// Returns the HTTP status this code is answered with.
    #[must_use]
    pub fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidRequestInput | Self::ValidationError | Self::PublishFailure => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DatabaseError | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the client-safe default message for this code.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "not permitted",
            Self::InvalidRequestInput => "invalid request input",
            Self::ValidationError => "invalid request",
            Self::NotFound => "not found",
            Self::DatabaseError => "database error",
            Self::PublishFailure => "failed to publish message",
            Self::Internal => "an unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error produced while serving a request.
#[derive(Debug)]
pub struct ServiceError {
    /// The error code.
    pub code: ErrorCode,
    /// The client-safe message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: StatusCode,
    /// The underlying cause, never sent to the client.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl ServiceError {
    /// Create a new `ServiceError` with the code's default message.
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.default_message().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `ServiceError` with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    // -- Convenience constructors --

    /// No session could be resolved.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated)
    }

    /// The session lacks the required permission.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden)
    }

    /// The request body could not be decoded.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequestInput, message)
    }

    /// The request failed validation.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationError, message)
    }

    /// The addressed resource does not exist.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound)
    }

    /// The data layer failed.
    #[must_use]
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::new(ErrorCode::DatabaseError).with_source(source)
    }

    /// The message bus refused a message.
    #[must_use]
    pub fn publish_failure(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::new(ErrorCode::PublishFailure).with_source(source)
    }

    /// Anything else.
    #[must_use]
    pub fn internal(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::new(ErrorCode::Internal).with_source(source)
    }
}

/// Create a [`ServiceError`] from a code name and optional message.
///
/// # Examples
///
/// ```
/// use pantry_model::service_error;
///
/// let err = service_error!(NotFound);
/// assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
///
/// let err = service_error!(ValidationError, "name: cannot be blank");
/// assert_eq!(err.message, "name: cannot be blank");
/// ```
#[macro_export]
macro_rules! service_error {
    ($code:ident) => {
        $crate::error::ServiceError::new($crate::error::ErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::ServiceError::with_message($crate::error::ErrorCode::$code, $msg)
    };
}

/// Errors returned by data managers.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,
    /// Any other storage failure.
    #[error("data layer failure: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DataError {
    /// Wrap an arbitrary storage failure.
    #[must_use]
    pub fn other(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(source.into())
    }
}

impl From<DataError> for ServiceError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound => Self::not_found(),
            DataError::Other(source) => Self::database(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_codes_to_statuses() {
        let expected = [
            (ErrorCode::Unauthenticated, 401),
            (ErrorCode::Forbidden, 403),
            (ErrorCode::InvalidRequestInput, 400),
            (ErrorCode::ValidationError, 400),
            (ErrorCode::NotFound, 404),
            (ErrorCode::DatabaseError, 500),
            (ErrorCode::PublishFailure, 400),
            (ErrorCode::Internal, 500),
        ];
        for (code, status) in expected {
            assert_eq!(code.default_status_code().as_u16(), status, "{code}");
        }
    }

    #[test]
    fn test_should_serialize_code_as_wire_string() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_should_keep_source_out_of_message() {
        let err = ServiceError::database("connection reset by peer");
        assert_eq!(err.message, "database error");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_should_build_with_macro() {
        let err = service_error!(Forbidden);
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.status_code, StatusCode::FORBIDDEN);

        let err = service_error!(InvalidRequestInput, "invalid queue name");
        assert_eq!(err.message, "invalid queue name");
        assert_eq!(err.status_code, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_convert_data_errors() {
        let err: ServiceError = DataError::NotFound.into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ServiceError = DataError::other("disk full").into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
