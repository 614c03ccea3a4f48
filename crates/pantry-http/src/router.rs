//! Method and path-template routing.
//!
//! Templates are `/`-separated; a `{name}` segment matches any single
//! non-empty segment and captures it into [`RouteParams`].

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::handler::PantryHandler;
use crate::params::RouteParams;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

fn parse_template(template: &str) -> Vec<Segment> {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Segment::Param(name.to_owned()),
            None => Segment::Literal(s.to_owned()),
        })
        .collect()
}

struct Route {
    method: Method,
    template: String,
    segments: Vec<Segment>,
    handler: Arc<dyn PantryHandler>,
}

impl Route {
    fn matches(&self, path: &[&str]) -> Option<RouteParams> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(lit) if lit.as_str() == *part => {}
                Segment::Param(name) => params.insert(name.clone(), *part),
                Segment::Literal(_) => return None,
            }
        }
        Some(params)
    }
}

/// Outcome of routing a request.
pub enum RouteMatch {
    /// A handler was found.
    Found(Arc<dyn PantryHandler>, RouteParams),
    /// The path is known but not for this method; carries the methods it takes.
    MethodNotAllowed(Vec<Method>),
    /// No route matches the path.
    NotFound,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(_, params) => f.debug_tuple("Found").field(params).finish(),
            Self::MethodNotAllowed(allowed) => f.debug_tuple("MethodNotAllowed").field(allowed).finish(),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Routes requests to handlers by method and path.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| format!("{} {}", r.method, r.template)))
            .finish()
    }
}

impl Router {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` on `template`.
    pub fn route(&mut self, method: Method, template: &str, handler: impl PantryHandler) -> &mut Self {
        tracing::debug!(%method, template, "registering route");
        self.routes.push(Route {
            method,
            template: template.to_owned(),
            segments: parse_template(template),
            handler: Arc::new(handler),
        });
        self
    }

    /// Find the handler for `method` and `path`.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> RouteMatch {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut allowed = Vec::new();

        for route in &self.routes {
            if let Some(params) = route.matches(&parts) {
                if route.method == *method {
                    return RouteMatch::Found(Arc::clone(&route.handler), params);
                }
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }
}
