//! Encoding error types.

use crate::content_type::ContentType;

/// Boxed error produced by an underlying format driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while encoding or decoding a value.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The value could not be represented in the target format, or the
    /// writer rejected the output.
    #[error("encoding {content_type} value: {source}")]
    Encode {
        /// The content type being produced.
        content_type: ContentType,
        /// The format driver's error.
        source: DriverError,
    },

    /// The input was not well-formed for the content type.
    #[error("decoding {content_type} value: {source}")]
    Decode {
        /// The content type being consumed.
        content_type: ContentType,
        /// The format driver's error.
        source: DriverError,
    },

    /// A strict decode saw fields the target type does not declare.
    #[error("decoding {content_type} value: unknown fields {}", fields.join(", "))]
    UnknownFields {
        /// The content type being consumed.
        content_type: ContentType,
        /// Paths of the rejected fields.
        fields: Vec<String>,
    },
}

impl EncodingError {
    /// Wrap a driver error raised while encoding.
    pub fn encode(content_type: ContentType, source: impl Into<DriverError>) -> Self {
        Self::Encode {
            content_type,
            source: source.into(),
        }
    }

    /// Wrap a driver error raised while decoding.
    pub fn decode(content_type: ContentType, source: impl Into<DriverError>) -> Self {
        Self::Decode {
            content_type,
            source: source.into(),
        }
    }

    /// The content type responsible for the failure.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Encode { content_type, .. }
            | Self::Decode { content_type, .. }
            | Self::UnknownFields { content_type, .. } => *content_type,
        }
    }

    /// Whether this error was raised on the encode side.
    #[must_use]
    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }
}
