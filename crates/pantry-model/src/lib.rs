//! Envelope, error taxonomy, session, and message types for Pantry.
//!
//! Every response a Pantry service writes is an [`ApiResponse`] envelope.
//! Failures are described by [`ServiceError`], whose [`ErrorCode`] is the
//! stable machine-readable axis surfaced to clients.

pub mod envelope;
pub mod error;
pub mod filter;
pub mod messages;
pub mod permissions;
pub mod session;
pub mod validation;

pub use envelope::{ApiResponse, Pagination, ResponseDetails, ResponseError};
pub use error::{DataError, ErrorCode, ServiceError};
pub use filter::{QueryFilter, QueryFilteredResult, SortOrder};
pub use messages::{DataChangeMessage, QueueMessage, QueueName};
pub use permissions::PermissionSet;
pub use session::{AccountStatus, Requester, SessionContext};
pub use validation::{Validate, ValidationContext, ValidationError, Validator};
