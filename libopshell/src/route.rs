//! Route table and location matcher
//!
//! Maps a location token (`"jobs"`, `"#/jobs/42"`, `"jobs/42?tab=notes"`) to
//! the page module registered for it. Literal patterns are looked up first,
//! then parameterized patterns (`"jobs/:id"`) in registration order; the first
//! match wins. Anything that does not match, including tokens whose parameter
//! segments are malformed, resolves to the default route. `resolve` cannot fail.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::RouteError;
use crate::page::{Cleanup, Page};

/// Parameters extracted from a location or supplied with a navigation request
pub type Params = BTreeMap<String, String>;

/// A page module bound to a location pattern
///
/// Immutable once registered.
#[derive(Clone)]
pub struct RouteEntry {
    pattern: String,
    page: Arc<dyn Page>,
    cleanup: Option<Arc<dyn Cleanup>>,
}

impl RouteEntry {
    /// Route whose page holds nothing that needs releasing
    pub fn new<P: Page + 'static>(pattern: impl Into<String>, page: P) -> Self {
        Self {
            pattern: pattern.into(),
            page: Arc::new(page),
            cleanup: None,
        }
    }

    /// Route for a module that implements both halves of the page contract
    pub fn module<M: Page + Cleanup + 'static>(pattern: impl Into<String>, module: Arc<M>) -> Self {
        let page: Arc<dyn Page> = module.clone();
        let cleanup: Arc<dyn Cleanup> = module;
        Self {
            pattern: pattern.into(),
            page,
            cleanup: Some(cleanup),
        }
    }

    pub fn with_cleanup<C: Cleanup + 'static>(mut self, cleanup: C) -> Self {
        self.cleanup = Some(Arc::new(cleanup));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern)
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Outcome of resolving a location
#[derive(Clone)]
pub struct ResolvedRoute {
    /// Pattern of the entry that matched
    pub pattern: String,
    pub page: Arc<dyn Page>,
    pub cleanup: Option<Arc<dyn Cleanup>>,
    /// Path parameters, plus query pairs that do not collide with them
    pub params: Params,
    /// True when nothing matched and the default route was substituted
    pub is_fallback: bool,
}

impl std::fmt::Debug for ResolvedRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedRoute")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("is_fallback", &self.is_fallback)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    fn parse(raw: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let path = normalize_location(raw);
        if path.contains('?') {
            return Err(invalid("patterns cannot carry a query string"));
        }
        if path.is_empty() {
            return Ok(Self { segments: Vec::new() });
        }

        let mut segments = Vec::new();
        let mut seen = Vec::new();
        for part in path.split('/') {
            if part.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("empty parameter name"));
                }
                if !is_identifier(name) {
                    return Err(invalid("parameter names must be identifiers"));
                }
                if seen.contains(&name) {
                    return Err(invalid("duplicate parameter name"));
                }
                seen.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else {
                if !part.chars().all(is_segment_char) {
                    return Err(invalid("literal segment contains reserved characters"));
                }
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self { segments })
    }

    /// Patterns differing only in parameter names can never both match
    fn same_shape(&self, other: &RoutePattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    fn literal_key(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.as_str(),
                Segment::Param(_) => "",
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(text) if text == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    if part.is_empty() || !part.chars().all(is_segment_char) {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%')
}

/// Strip the decorations a location token may arrive with
///
/// `"#/jobs/42/"`, `"/jobs/42"` and `"jobs/42"` all normalize to `"jobs/42"`.
pub fn normalize_location(token: &str) -> String {
    let trimmed = token.trim();
    let trimmed = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let (path, query) = match trimmed.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (trimmed, None),
    };
    let path = path.trim_matches('/');
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

fn parse_query(query: &str) -> Params {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

struct CompiledRoute {
    entry: RouteEntry,
    pattern: RoutePattern,
}

/// Static registry mapping location tokens to page modules
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    exact: HashMap<String, usize>,
    parameterized: Vec<usize>,
    default_index: usize,
}

impl RouteTable {
    /// Create a table around its default route
    ///
    /// The default route must be a literal pattern; its key is what every
    /// unmatched location and every failed load falls back to.
    pub fn new(default: RouteEntry) -> Result<Self, RouteError> {
        let pattern = RoutePattern::parse(default.pattern())?;
        if !pattern.is_literal() {
            return Err(RouteError::InvalidPattern {
                pattern: default.pattern().to_string(),
                reason: "the default route cannot take parameters".to_string(),
            });
        }

        let mut table = Self {
            routes: Vec::new(),
            exact: HashMap::new(),
            parameterized: Vec::new(),
            default_index: 0,
        };
        table.insert(default, pattern)?;
        Ok(table)
    }

    /// Register another route
    pub fn register(&mut self, entry: RouteEntry) -> Result<(), RouteError> {
        let pattern = RoutePattern::parse(entry.pattern())?;
        self.insert(entry, pattern)
    }

    /// Builder-style [`register`](Self::register)
    pub fn route(mut self, entry: RouteEntry) -> Result<Self, RouteError> {
        self.register(entry)?;
        Ok(self)
    }

    fn insert(&mut self, entry: RouteEntry, pattern: RoutePattern) -> Result<(), RouteError> {
        if self.routes.iter().any(|r| r.pattern.same_shape(&pattern)) {
            return Err(RouteError::DuplicatePattern(entry.pattern().to_string()));
        }

        let index = self.routes.len();
        if pattern.is_literal() {
            self.exact.insert(pattern.literal_key(), index);
        } else {
            self.parameterized.push(index);
        }
        tracing::debug!(pattern = entry.pattern(), "registered route");
        self.routes.push(CompiledRoute { entry, pattern });
        Ok(())
    }

    /// Key every fallback lands on
    pub fn default_key(&self) -> String {
        self.routes[self.default_index].pattern.literal_key()
    }

    /// The default route, resolved without parameters
    pub fn default_route(&self) -> ResolvedRoute {
        self.resolved(self.default_index, Params::new(), false)
    }

    /// Resolve a location token, substituting the default route when nothing matches
    pub fn resolve(&self, token: &str) -> ResolvedRoute {
        let normalized = normalize_location(token);
        let (path, query) = match normalized.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (normalized.as_str(), Params::new()),
        };

        if let Some(&index) = self.exact.get(path) {
            return self.resolved(index, query, false);
        }

        for &index in &self.parameterized {
            if let Some(mut params) = self.routes[index].pattern.matches(path) {
                for (key, value) in query {
                    params.entry(key).or_insert(value);
                }
                return self.resolved(index, params, false);
            }
        }

        tracing::debug!(location = token, "no route matched, using default");
        self.resolved(self.default_index, Params::new(), true)
    }

    fn resolved(&self, index: usize, params: Params, is_fallback: bool) -> ResolvedRoute {
        let entry = &self.routes[index].entry;
        ResolvedRoute {
            pattern: entry.pattern.clone(),
            page: Arc::clone(&entry.page),
            cleanup: entry.cleanup.clone(),
            params,
            is_fallback,
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered patterns in registration order
    pub fn patterns(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.entry.pattern()).collect()
    }
}
