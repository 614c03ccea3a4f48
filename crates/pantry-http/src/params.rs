//! Route parameters and the ID fetchers that read them.

use std::collections::HashMap;

/// Path parameters captured by the router, stored in request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `value` for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Extracts one resource ID from a request.
pub trait IdFetcher: Send + Sync + 'static {
    /// The ID, or an empty string when absent.
    fn fetch_id(&self, parts: &http::request::Parts) -> String;
}

/// Reads a named route parameter.
#[derive(Debug, Clone, Copy)]
pub struct RouteParamFetcher {
    name: &'static str,
}

impl RouteParamFetcher {
    /// Fetch the parameter called `name`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// The parameter name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl IdFetcher for RouteParamFetcher {
    fn fetch_id(&self, parts: &http::request::Parts) -> String {
        parts
            .extensions
            .get::<RouteParams>()
            .and_then(|p| p.get(self.name))
            .unwrap_or_default()
            .to_owned()
    }
}
