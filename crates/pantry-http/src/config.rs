//! HTTP layer configuration.

use pantry_core::PantryConfig;
use pantry_encoding::ContentType;

/// Configuration for the Pantry HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PantryHttpConfig {
    /// Content type of responses when no other is negotiated.
    pub default_content_type: ContentType,
    /// Whether request spans carry real trace IDs.
    pub tracing_enabled: bool,
    /// Service name recorded on every span.
    pub service_name: String,
}

impl Default for PantryHttpConfig {
    fn default() -> Self {
        Self {
            default_content_type: ContentType::Json,
            tracing_enabled: true,
            service_name: "pantry".to_owned(),
        }
    }
}

impl From<&PantryConfig> for PantryHttpConfig {
    fn from(config: &PantryConfig) -> Self {
        Self {
            default_content_type: ContentType::from_mime(&config.content_type),
            tracing_enabled: config.tracing_enabled,
            service_name: config.service_name.clone(),
        }
    }
}
