//! Route table resolving requests to ordered handler chains.
//!
//! Every route whose method and pattern match contributes its handlers, so a
//! prefix-mounted middleware and an exact route combine into one chain.

use crate::handler::{BoxedHandler, FezzError};
use crate::http::Method;
use crate::routing::{MatchResult, Resolver};
use async_trait::async_trait;
use std::collections::HashMap;

/// Parameter name under which a trailing `*` captures the rest of the path.
pub const WILDCARD_PARAM: &str = "wild";

/// One parsed segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Must equal the path segment.
    Static(String),
    /// `:name`, `:name?` or `:name.ext`.
    Param {
        name: String,
        optional: bool,
        suffix: Option<String>,
    },
    /// `*`, matching zero or more trailing segments. `/assets` therefore
    /// matches `/assets/*` with an empty capture.
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "*" {
            return Segment::Wildcard;
        }
        let Some(param) = raw.strip_prefix(':') else {
            return Segment::Static(raw.to_string());
        };
        let (param, optional) = match param.strip_suffix('?') {
            Some(p) => (p, true),
            None => (param, false),
        };
        match param.find('.') {
            Some(dot) => Segment::Param {
                name: param[..dot].to_string(),
                optional,
                suffix: Some(param[dot..].to_string()),
            },
            None => Segment::Param {
                name: param.to_string(),
                optional,
                suffix: None,
            },
        }
    }
}

/// Split a path into segments, ignoring the leading and one trailing slash.
fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Match `segments` against `parts`, backtracking over optional params.
///
/// Params are recorded only once the remainder matched, so a failed branch
/// leaves nothing behind. A param captured deeper in the pattern keeps
/// precedence over an earlier one of the same name.
fn match_segments(
    segments: &[Segment],
    parts: &[&str],
    prefix: bool,
    params: &mut HashMap<String, String>,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return prefix || parts.is_empty();
    };

    match segment {
        Segment::Static(s) => match parts.split_first() {
            Some((part, tail)) if *part == s.as_str() => match_segments(rest, tail, prefix, params),
            _ => false,
        },
        Segment::Param {
            name,
            optional,
            suffix,
        } => {
            if let Some((part, tail)) = parts.split_first() {
                let value = match suffix {
                    Some(ext) => part.strip_suffix(ext.as_str()),
                    None => Some(*part),
                };
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    if match_segments(rest, tail, prefix, params) {
                        params.entry(name.clone()).or_insert_with(|| value.to_string());
                        return true;
                    }
                }
            }
            *optional && match_segments(rest, parts, prefix, params)
        }
        Segment::Wildcard => {
            if !match_segments(rest, &[], prefix, params) {
                return false;
            }
            params
                .entry(WILDCARD_PARAM.to_string())
                .or_insert_with(|| parts.join("/"));
            true
        }
    }
}

/// A route entry mapping a pattern to a handler chain.
#[derive(Clone)]
pub struct Route {
    /// HTTP method, or `None` for every method.
    pub method: Option<Method>,
    /// Route pattern as registered (e.g. "/api/users/:id").
    pub pattern: String,
    /// Whether the pattern matches as a path prefix.
    pub prefix: bool,
    segments: Vec<Segment>,
    handlers: Vec<BoxedHandler>,
}

impl Route {
    /// Create a route matching the whole path.
    pub fn new(method: Option<Method>, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> Self {
        let pattern = pattern.into();
        let segments = split_path(&pattern).into_iter().map(Segment::parse).collect();
        Self {
            method,
            pattern,
            prefix: false,
            segments,
            handlers,
        }
    }

    /// Create a route for every method matching `pattern` as a path prefix.
    pub fn mounted(pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> Self {
        Self {
            prefix: true,
            ..Self::new(None, pattern, handlers)
        }
    }

    /// Handlers bound to this route.
    pub fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }

    /// Check if this route applies to the given method. `HEAD` is served by `GET` routes.
    pub fn matches_method(&self, method: &Method) -> bool {
        match &self.method {
            None => true,
            Some(m) => m == method || (*method == Method::Head && *m == Method::Get),
        }
    }

    /// Match the path, returning the captured parameters.
    pub fn capture(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts = split_path(path);
        let mut params = HashMap::new();
        match_segments(&self.segments, &parts, self.prefix, &mut params).then_some(params)
    }

    /// Check if this route matches the given method and path.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.matches_method(method) && self.capture(path).is_some()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("prefix", &self.prefix)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Route table in registration order.
///
/// Built during setup and read-only afterwards, so lookups take no locks.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Create a new route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route to the table.
    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Collect the handlers and parameters of every route matching the request.
    ///
    /// Later routes overwrite parameters captured by earlier ones.
    pub fn find(&self, method: &Method, path: &str) -> MatchResult {
        let mut result = MatchResult::empty();
        for route in self.routes.iter().filter(|r| r.matches_method(method)) {
            if let Some(params) = route.capture(path) {
                result.params.extend(params);
                result.handlers.extend(route.handlers.iter().cloned());
            }
        }
        result
    }

    /// List all routes.
    pub fn list(&self) -> &[Route] {
        &self.routes
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check whether no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl Resolver for RouteTable {
    async fn resolve(&self, method: &Method, path: &str) -> Result<MatchResult, FezzError> {
        Ok(self.find(method, path))
    }
}
