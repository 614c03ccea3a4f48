//! Configuration management for Pantry services.
//!
//! All configuration is driven by environment variables.

use crate::error::{PantryError, PantryResult};

/// Global configuration for a Pantry process.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryConfig {
    /// Bind address for the HTTP server.
    pub gateway_listen: String,
    /// Log level.
    pub log_level: String,
    /// MIME string selecting the process-wide default codec.
    pub content_type: String,
    /// Whether request spans carry real trace IDs.
    pub tracing_enabled: bool,
    /// Service name recorded on every span.
    pub service_name: String,
}

impl Default for PantryConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:8000".to_owned(),
            log_level: "info".to_owned(),
            content_type: "application/json".to_owned(),
            tracing_enabled: true,
            service_name: "pantry".to_owned(),
        }
    }
}

impl PantryConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Keys that resolve to `None` keep their default.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("CONTENT_TYPE") {
            config.content_type = v;
        }
        if let Some(v) = lookup("TRACING_ENABLED") {
            config.tracing_enabled = parse_bool(&v, true);
        }
        if let Some(v) = lookup("SERVICE_NAME") {
            config.service_name = v;
        }

        config
    }

    /// Validate the loaded configuration.
    ///
    /// An explicitly blank `CONTENT_TYPE` is rejected. Unrecognised but
    /// non-blank values are accepted and resolve to JSON downstream.
    pub fn validate(&self) -> PantryResult<()> {
        if self.content_type.trim().is_empty() {
            return Err(PantryError::Config(
                "CONTENT_TYPE must not be empty".to_owned(),
            ));
        }
        if self.gateway_listen.trim().is_empty() {
            return Err(PantryError::Config(
                "GATEWAY_LISTEN must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => true,
        "0" | "false" | "no" => false,
        _ => default,
    }
}
