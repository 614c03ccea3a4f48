//! Log subscriber setup driven by [`PantryConfig`].
//!
//! With tracing enabled the server logs JSON lines that carry the current
//! request span, so every event can be joined to its trace ID. Without it,
//! logs are compact text.

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use pantry_core::PantryConfig;

/// Shape of emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with the enclosing span's fields.
    Json,
    /// Human-readable single lines.
    Compact,
}

impl LogFormat {
    /// The format `config` asks for.
    #[must_use]
    pub fn for_config(config: &PantryConfig) -> Self {
        if config.tracing_enabled {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// The event filter: `rust_log` when given, otherwise the configured level.
pub fn log_filter(config: &PantryConfig, rust_log: Option<&str>) -> Result<EnvFilter> {
    let directives = rust_log.unwrap_or(config.log_level.as_str());
    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter: {directives}"))
}

fn build_subscriber(config: &PantryConfig, filter: EnvFilter) -> Box<dyn Subscriber + Send + Sync> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    match LogFormat::for_config(config) {
        LogFormat::Json => Box::new(
            builder
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .finish(),
        ),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    }
}

/// Install the global subscriber and return the span every server task runs in.
pub fn init(config: &PantryConfig) -> Result<tracing::Span> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(config, rust_log.as_deref())?;

    tracing::subscriber::set_global_default(build_subscriber(config, filter))
        .context("installing tracing subscriber")?;

    Ok(service_span(config))
}

/// Root span naming the service, parent of every connection span.
#[must_use]
pub fn service_span(config: &PantryConfig) -> tracing::Span {
    tracing::info_span!("service", name = %config.service_name)
}
