//! Request validation.
//!
//! Types implement [`Validate`] by chaining rules on a [`Validator`]. The
//! [`ValidationContext`] carries the caller's session for rules that depend
//! on who is asking:
//!
//! ```
//! use pantry_model::validation::{Validate, ValidationContext, ValidationError, Validator};
//!
//! struct Input {
//!     name: String,
//! }
//!
//! impl Validate for Input {
//!     fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), ValidationError> {
//!         Validator::new().required("name", &self.name).finish()
//!     }
//! }
//!
//! let err = Input { name: String::new() }
//!     .validate(&ValidationContext::default())
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "name: cannot be blank");
//! ```

use std::fmt;

use crate::session::SessionContext;

/// What a validator may know about the request besides the input itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    session: Option<&'a SessionContext>,
}

impl<'a> ValidationContext<'a> {
    /// A context for a request made under `session`.
    #[must_use]
    pub fn new(session: Option<&'a SessionContext>) -> Self {
        Self { session }
    }

    /// The caller's session, absent before one is resolved.
    #[must_use]
    pub fn session(&self) -> Option<&'a SessionContext> {
        self.session
    }
}

/// Something that can check its own well-formedness.
pub trait Validate {
    /// Returns every rule violation, or `Ok(())`.
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationError>;
}

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as it appears on the wire.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

/// All rule violations of one value, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Individual violations.
    pub fields: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collects rule violations.
#[derive(Debug, Default)]
pub struct Validator {
    fields: Vec<FieldError>,
}

impl Validator {
    /// A validator with no violations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation when `ok` is false.
    #[must_use]
    pub fn check(mut self, field: &'static str, ok: bool, reason: impl Into<String>) -> Self {
        if !ok {
            self.fields.push(FieldError {
                field,
                reason: reason.into(),
            });
        }
        self
    }

    /// `value` must not be blank.
    #[must_use]
    pub fn required(self, field: &'static str, value: &str) -> Self {
        self.check(field, !value.trim().is_empty(), "cannot be blank")
    }

    /// `value` must have between `min` and `max` characters.
    #[must_use]
    pub fn length(self, field: &'static str, value: &str, min: usize, max: usize) -> Self {
        let len = value.chars().count();
        self.check(
            field,
            (min..=max).contains(&len),
            format!("the length must be between {min} and {max}"),
        )
    }

    /// `values` must not be empty.
    #[must_use]
    pub fn not_empty<T>(self, field: &'static str, values: &[T]) -> Self {
        self.check(field, !values.is_empty(), "cannot be empty")
    }

    /// `value` must be an absolute http or https URL.
    #[must_use]
    pub fn url(self, field: &'static str, value: &str) -> Self {
        let ok = ["http://", "https://"]
            .iter()
            .any(|scheme| value.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()));
        self.check(field, ok, "must be a valid URL")
    }

    /// `value` must be one of `allowed`.
    #[must_use]
    pub fn one_of(self, field: &'static str, value: &str, allowed: &[&str]) -> Self {
        self.check(field, allowed.contains(&value), "must be a valid value")
    }

    /// Finish, returning every recorded violation.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                fields: self.fields,
            })
        }
    }
}
