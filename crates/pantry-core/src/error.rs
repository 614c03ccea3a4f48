//! Error types for the Pantry core.

/// Core error type for Pantry infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum PantryError {
    /// A configuration value failed validation.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for Pantry core operations.
pub type PantryResult<T> = Result<T, PantryError>;
