//! Integration tests for Pantry server.
//!
//! These tests require a running Pantry server at `localhost:8000`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p pantry-integration -- --ignored
//! ```

use std::sync::Once;

use reqwest::header::{HeaderMap, HeaderValue};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of the server under test.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("PANTRY_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8000".to_owned())
}

/// Absolute URL for `path`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", endpoint_url())
}

/// A fresh household ID, so tests never observe each other's records.
#[must_use]
pub fn test_household_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a client that authenticates as `user-1` in `household_id`,
/// holding `permissions` there.
#[must_use]
pub fn client(household_id: &str, permissions: &[&str]) -> reqwest::Client {
    init_tracing();

    let mut headers = HeaderMap::new();
    headers.insert("X-Pantry-User-ID", HeaderValue::from_static("user-1"));
    headers.insert(
        "X-Pantry-Household-ID",
        HeaderValue::from_str(household_id).unwrap_or_else(|e| panic!("bad household ID: {e}")),
    );
    headers.insert(
        "X-Pantry-Permissions",
        HeaderValue::from_str(&permissions.join(","))
            .unwrap_or_else(|e| panic!("bad permissions: {e}")),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap_or_else(|e| panic!("failed to build client: {e}"))
}

/// Create a client that carries no session headers.
#[must_use]
pub fn anonymous_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

mod test_admin;
mod test_envelope;
mod test_webhooks;
