//! Route table module
//!
//! Routes are matched in registration order; the first route whose
//! method and template both match wins.

use hyper::Method;

use super::pattern::{PathParams, PathPattern, PatternError};

struct Route<H> {
    method: Method,
    pattern: PathPattern,
    handler: H,
}

/// Outcome of resolving a request against the table
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a, H> {
    Matched(&'a H, PathParams),
    /// Path is known but not for this method; carries the allowed methods
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` + `template`
    pub fn add(&mut self, method: Method, template: &str, handler: H) -> Result<(), PatternError> {
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(template)?,
            handler,
        });
        Ok(())
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_, H> {
        let mut allowed = Vec::new();

        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            if route.method == *method {
                return Resolution::Matched(&route.handler, params);
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }

        if allowed.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::MethodNotAllowed(allowed)
        }
    }

    /// Methods registered for `path` (empty when the path is unknown)
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed: Vec<Method> = Vec::new();
        for route in self.routes.iter().filter(|r| r.pattern.matches(path).is_some()) {
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }
        allowed
    }

    /// `(method, template)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|r| (r.method.as_str(), r.pattern.template()))
    }
}
