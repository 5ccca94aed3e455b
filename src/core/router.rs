//! Route tables and resolution.
//!
//! Two independent tables share the same two-partition shape: a literal map
//! from normalized path to handlers, and an ordered pattern list scanned in
//! registration order. The HTTP table adds the method dimension and the
//! `OPTIONS` method-set collection; the WebSocket table is path-only.
//!
//! Tables are populated during startup and read-only while serving; the
//! conflict checks below run at registration time so a bad layout dies at
//! boot, not on a request.

use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::handler::{HttpHandler, WsHandler};

/// Fatal registration-time errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RouteError {
    /// The `(path, method)` pair is already taken.
    #[error("duplicate route registration for {method} {path}")]
    DuplicateRoute { path: String, method: Method },

    /// The WebSocket path is already taken.
    #[error("duplicate channel registration for {path}")]
    DuplicateWsRoute { path: String },

    /// Literal routes must begin with a separator.
    #[error("literal route must start with '/' (got {0:?})")]
    InvalidPath(String),
}

/// What a route is keyed by: an exact path or a compiled pattern.
#[derive(Debug, Clone)]
pub enum RoutePattern {
    Literal(String),
    Pattern(Regex),
}

impl From<&str> for RoutePattern {
    fn from(path: &str) -> Self {
        RoutePattern::Literal(path.to_string())
    }
}

impl From<Regex> for RoutePattern {
    fn from(regex: Regex) -> Self {
        RoutePattern::Pattern(regex)
    }
}

/// One HTTP route definition: pattern, ordered method set (default `GET`),
/// optional content-type override.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pattern: RoutePattern,
    methods: Vec<Method>,
    content_type: Option<String>,
}

impl RouteDef {
    /// A literal route at `path`.
    pub fn at(path: &str) -> Self {
        Self {
            pattern: RoutePattern::Literal(path.to_string()),
            methods: vec![Method::GET],
            content_type: None,
        }
    }

    /// A pattern route matched from the start of the path; capture groups
    /// become positional handler arguments.
    pub fn pattern(regex: Regex) -> Self {
        Self {
            pattern: RoutePattern::Pattern(regex),
            methods: vec![Method::GET],
            content_type: None,
        }
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// One WebSocket route definition: pattern plus optional content-type
/// override (no method dimension).
#[derive(Debug, Clone)]
pub struct WsRouteDef {
    pattern: RoutePattern,
    content_type: Option<String>,
}

impl WsRouteDef {
    pub fn at(path: &str) -> Self {
        Self {
            pattern: RoutePattern::Literal(path.to_string()),
            content_type: None,
        }
    }

    pub fn pattern(regex: Regex) -> Self {
        Self {
            pattern: RoutePattern::Pattern(regex),
            content_type: None,
        }
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

struct MethodEntry {
    handler: Arc<dyn HttpHandler>,
    content_type: Option<String>,
}

#[derive(Default)]
struct LiteralEntry {
    by_method: HashMap<Method, MethodEntry>,
    // registration order, for the OPTIONS method list
    order: Vec<Method>,
}

struct PatternRoute {
    regex: Regex,
    methods: Vec<Method>,
    handler: Arc<dyn HttpHandler>,
    content_type: Option<String>,
}

/// Outcome of HTTP resolution.
pub enum HttpResolution {
    /// A handler owns this `(path, method)`.
    Matched {
        handler: Arc<dyn HttpHandler>,
        args: Vec<String>,
        content_type: Option<String>,
    },
    /// `OPTIONS` preflight: the registration-ordered method set of whatever
    /// route owns the path (empty when nothing does).
    Options { methods: Vec<Method> },
    /// The path is registered, the method is not.
    MethodNotAllowed,
    NotFound,
}

/// The HTTP route table.
#[derive(Default)]
pub struct HttpRouteTable {
    literal: HashMap<String, LiteralEntry>,
    patterns: Vec<PatternRoute>,
}

impl HttpRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Literal duplicates of a `(path, method)` pair fail;
    /// pattern duplicates are allowed and reachable in registration order
    /// only (the first registered shadows overlapping later ones).
    pub fn register(&mut self, def: RouteDef, handler: Arc<dyn HttpHandler>) -> Result<(), RouteError> {
        match def.pattern {
            RoutePattern::Literal(path) => {
                if !path.starts_with('/') {
                    return Err(RouteError::InvalidPath(path));
                }
                let normalized = normalize_path(&path);
                let entry = self.literal.entry(normalized.clone()).or_default();
                for method in def.methods {
                    if entry.by_method.contains_key(&method) {
                        return Err(RouteError::DuplicateRoute {
                            path: normalized,
                            method,
                        });
                    }
                    entry.order.push(method.clone());
                    entry.by_method.insert(
                        method,
                        MethodEntry {
                            handler: handler.clone(),
                            content_type: def.content_type.clone(),
                        },
                    );
                }
            }
            RoutePattern::Pattern(regex) => {
                self.patterns.push(PatternRoute {
                    regex,
                    methods: def.methods,
                    handler,
                    content_type: def.content_type,
                });
            }
        }
        Ok(())
    }

    /// Resolve a `(path, method)` pair.
    ///
    /// `OPTIONS` always resolves to the synthesized preflight outcome. For
    /// the rest: literal lookup first, then the ordered pattern scan, where
    /// the first pattern matching the path fixes the classification; a
    /// later pattern that would also match is not consulted.
    pub fn resolve(&self, path: &str, method: &Method) -> HttpResolution {
        if *method == Method::OPTIONS {
            return HttpResolution::Options {
                methods: self.allowed_methods(path),
            };
        }
        if let Some(entry) = self.literal.get(&normalize_path(path)) {
            return match entry.by_method.get(method) {
                Some(route) => HttpResolution::Matched {
                    handler: route.handler.clone(),
                    args: Vec::new(),
                    content_type: route.content_type.clone(),
                },
                None => HttpResolution::MethodNotAllowed,
            };
        }
        for route in &self.patterns {
            if let Some(args) = match_pattern(&route.regex, path) {
                return if route.methods.contains(method) {
                    HttpResolution::Matched {
                        handler: route.handler.clone(),
                        args,
                        content_type: route.content_type.clone(),
                    }
                } else {
                    HttpResolution::MethodNotAllowed
                };
            }
        }
        HttpResolution::NotFound
    }

    /// The registration-ordered method set of the route owning `path`, for
    /// preflight synthesis. Empty when no route owns the path.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        if let Some(entry) = self.literal.get(&normalize_path(path)) {
            return entry.order.clone();
        }
        for route in &self.patterns {
            if match_pattern(&route.regex, path).is_some() {
                return route.methods.clone();
            }
        }
        Vec::new()
    }
}

struct WsEntry {
    handler: Arc<dyn WsHandler>,
    content_type: Option<String>,
}

struct WsPatternRoute {
    regex: Regex,
    handler: Arc<dyn WsHandler>,
    content_type: Option<String>,
}

/// Outcome of WebSocket resolution: path-only, so no method classification.
pub enum WsResolution {
    Matched {
        handler: Arc<dyn WsHandler>,
        args: Vec<String>,
        content_type: Option<String>,
    },
    NotFound,
}

/// The WebSocket route table.
#[derive(Default)]
pub struct WsRouteTable {
    literal: HashMap<String, WsEntry>,
    patterns: Vec<WsPatternRoute>,
}

impl WsRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: WsRouteDef, handler: Arc<dyn WsHandler>) -> Result<(), RouteError> {
        match def.pattern {
            RoutePattern::Literal(path) => {
                if !path.starts_with('/') {
                    return Err(RouteError::InvalidPath(path));
                }
                let normalized = normalize_path(&path);
                if self.literal.contains_key(&normalized) {
                    return Err(RouteError::DuplicateWsRoute { path: normalized });
                }
                self.literal.insert(
                    normalized,
                    WsEntry {
                        handler,
                        content_type: def.content_type,
                    },
                );
            }
            RoutePattern::Pattern(regex) => {
                self.patterns.push(WsPatternRoute {
                    regex,
                    handler,
                    content_type: def.content_type,
                });
            }
        }
        Ok(())
    }

    pub fn resolve(&self, path: &str) -> WsResolution {
        if let Some(entry) = self.literal.get(&normalize_path(path)) {
            return WsResolution::Matched {
                handler: entry.handler.clone(),
                args: Vec::new(),
                content_type: entry.content_type.clone(),
            };
        }
        for route in &self.patterns {
            if let Some(args) = match_pattern(&route.regex, path) {
                return WsResolution::Matched {
                    handler: route.handler.clone(),
                    args,
                    content_type: route.content_type.clone(),
                };
            }
        }
        WsResolution::NotFound
    }
}

/// Literal paths always carry a trailing separator so `/x` and `/x/` resolve
/// identically.
fn normalize_path(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Match a pattern against the raw (unnormalized) path, anchored at the
/// start. Capture groups become positional arguments; groups that did not
/// participate bind empty.
fn match_pattern(regex: &Regex, path: &str) -> Option<Vec<String>> {
    let captures = regex.captures(path)?;
    if captures.get(0).is_some_and(|whole| whole.start() != 0) {
        return None;
    }
    Some(
        (1..captures.len())
            .map(|index| {
                captures
                    .get(index)
                    .map(|group| group.as_str().to_string())
                    .unwrap_or_default()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::BodyValue;
    use crate::core::handler::{BoxFuture, HandlerResult};

    // Minimal no-op handlers for table tests; resolution never invokes them.
    fn noop<'a>(
        _request: &'a crate::core::request::HttpRequest,
        _response: &'a mut crate::core::response::HttpResponse,
        _args: &'a [String],
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move { Ok(BodyValue::Empty) })
    }

    fn ws_noop<'a>(
        _request: &'a crate::core::request::WsRequest,
        _responder: &'a crate::core::response::WsResponder,
        _args: &'a [String],
    ) -> BoxFuture<'a, Result<(), crate::core::handler::HandlerError>> {
        Box::pin(async move { Ok(()) })
    }

    fn table() -> HttpRouteTable {
        let mut table = HttpRouteTable::new();
        table.register(RouteDef::at("/"), Arc::new(noop)).unwrap();
        table
            .register(
                RouteDef::at("/post").methods([Method::POST]),
                Arc::new(noop),
            )
            .unwrap();
        table
            .register(RouteDef::pattern(Regex::new("/text.+").unwrap()), Arc::new(noop))
            .unwrap();
        table
            .register(
                RouteDef::pattern(Regex::new("/param-(.*)").unwrap()),
                Arc::new(noop),
            )
            .unwrap();
        table
    }

    #[test]
    fn literal_resolution_by_method() {
        let table = table();
        assert!(matches!(
            table.resolve("/", &Method::GET),
            HttpResolution::Matched { .. }
        ));
        assert!(matches!(
            table.resolve("/post", &Method::POST),
            HttpResolution::Matched { .. }
        ));
        assert!(matches!(
            table.resolve("/post", &Method::GET),
            HttpResolution::MethodNotAllowed
        ));
        assert!(matches!(
            table.resolve("/missing", &Method::GET),
            HttpResolution::NotFound
        ));
    }

    #[test]
    fn trailing_separator_is_normalized_both_ways() {
        let mut table = HttpRouteTable::new();
        table.register(RouteDef::at("/x"), Arc::new(noop)).unwrap();
        table.register(RouteDef::at("/y/"), Arc::new(noop)).unwrap();

        assert!(matches!(table.resolve("/x", &Method::GET), HttpResolution::Matched { .. }));
        assert!(matches!(table.resolve("/x/", &Method::GET), HttpResolution::Matched { .. }));
        assert!(matches!(table.resolve("/y", &Method::GET), HttpResolution::Matched { .. }));
        assert!(matches!(table.resolve("/y/", &Method::GET), HttpResolution::Matched { .. }));
    }

    #[test]
    fn pattern_requires_a_real_match() {
        let table = table();
        // `/text.+` needs at least one character after the prefix.
        assert!(matches!(
            table.resolve("/text", &Method::GET),
            HttpResolution::NotFound
        ));
        assert!(matches!(
            table.resolve("/text-", &Method::GET),
            HttpResolution::Matched { .. }
        ));
    }

    #[test]
    fn pattern_captures_bind_positionally() {
        let table = table();
        match table.resolve("/param-jezevec", &Method::GET) {
            HttpResolution::Matched { args, .. } => assert_eq!(args, vec!["jezevec".to_string()]),
            _ => panic!("expected a pattern match"),
        }
    }

    #[test]
    fn pattern_match_is_anchored_at_path_start() {
        let mut table = HttpRouteTable::new();
        table
            .register(RouteDef::pattern(Regex::new("/inner").unwrap()), Arc::new(noop))
            .unwrap();
        assert!(matches!(
            table.resolve("/outer/inner", &Method::GET),
            HttpResolution::NotFound
        ));
        assert!(matches!(
            table.resolve("/inner/deeper", &Method::GET),
            HttpResolution::Matched { .. }
        ));
    }

    #[test]
    fn first_path_matching_pattern_fixes_the_outcome() {
        let mut table = HttpRouteTable::new();
        table
            .register(
                RouteDef::pattern(Regex::new("/shared.*").unwrap()).methods([Method::POST]),
                Arc::new(noop),
            )
            .unwrap();
        // Also matches the path and would allow GET, but is registered later.
        table
            .register(RouteDef::pattern(Regex::new("/shared.*").unwrap()), Arc::new(noop))
            .unwrap();

        assert!(matches!(
            table.resolve("/shared/thing", &Method::GET),
            HttpResolution::MethodNotAllowed
        ));
        assert!(matches!(
            table.resolve("/shared/thing", &Method::POST),
            HttpResolution::Matched { .. }
        ));
    }

    #[test]
    fn duplicate_literal_registration_fails_fatally() {
        let mut table = HttpRouteTable::new();
        table.register(RouteDef::at("/dup"), Arc::new(noop)).unwrap();
        let error = table
            .register(RouteDef::at("/dup/"), Arc::new(noop))
            .unwrap_err();
        assert!(matches!(error, RouteError::DuplicateRoute { .. }));

        // Same path with a disjoint method set is fine.
        table
            .register(RouteDef::at("/dup").methods([Method::POST]), Arc::new(noop))
            .unwrap();
    }

    #[test]
    fn literal_route_must_start_with_separator() {
        let mut table = HttpRouteTable::new();
        let error = table
            .register(RouteDef::at("no-slash"), Arc::new(noop))
            .unwrap_err();
        assert!(matches!(error, RouteError::InvalidPath(_)));
    }

    #[test]
    fn options_collects_methods_in_registration_order() {
        let mut table = HttpRouteTable::new();
        table
            .register(
                RouteDef::at("/options").methods([Method::GET, Method::POST, Method::HEAD]),
                Arc::new(noop),
            )
            .unwrap();

        match table.resolve("/options", &Method::OPTIONS) {
            HttpResolution::Options { methods } => {
                assert_eq!(methods, vec![Method::GET, Method::POST, Method::HEAD])
            }
            _ => panic!("expected the preflight outcome"),
        }
        match table.resolve("/missing", &Method::OPTIONS) {
            HttpResolution::Options { methods } => assert!(methods.is_empty()),
            _ => panic!("expected the preflight outcome"),
        }
    }

    #[test]
    fn ws_table_resolves_path_only() {
        let mut table = WsRouteTable::new();
        table.register(WsRouteDef::at("/chat"), Arc::new(ws_noop)).unwrap();
        table
            .register(
                WsRouteDef::pattern(Regex::new("/room-(.*)").unwrap()),
                Arc::new(ws_noop),
            )
            .unwrap();

        assert!(matches!(table.resolve("/chat"), WsResolution::Matched { .. }));
        assert!(matches!(table.resolve("/chat/"), WsResolution::Matched { .. }));
        match table.resolve("/room-lobby") {
            WsResolution::Matched { args, .. } => assert_eq!(args, vec!["lobby".to_string()]),
            WsResolution::NotFound => panic!("expected a pattern match"),
        }
        assert!(matches!(table.resolve("/nope"), WsResolution::NotFound));

        let error = table
            .register(WsRouteDef::at("/chat/"), Arc::new(ws_noop))
            .unwrap_err();
        assert!(matches!(error, RouteError::DuplicateWsRoute { .. }));
    }
}
