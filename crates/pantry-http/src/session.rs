//! Session context resolution.

use pantry_model::SessionContext;

/// Why no session could be resolved.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request carries no credentials.
    #[error("no session attached to request")]
    Missing,
    /// The credentials could not be turned into a session.
    #[error("invalid session: {0}")]
    Invalid(String),
}

/// Resolves the caller's session from a request.
pub trait SessionContextFetcher: Send + Sync + 'static {
    /// Fetch the session for `parts`.
    fn fetch_session(&self, parts: &http::request::Parts) -> Result<SessionContext, SessionError>;
}

impl<F> SessionContextFetcher for F
where
    F: Fn(&http::request::Parts) -> Result<SessionContext, SessionError> + Send + Sync + 'static,
{
    fn fetch_session(&self, parts: &http::request::Parts) -> Result<SessionContext, SessionError> {
        self(parts)
    }
}
