use std::collections::HashSet;

use axum::http::Method;

/// Per-route idempotence flags, fixed when the router is built.
///
/// Routes are identified by method plus the path template they were
/// registered with (what axum exposes as `MatchedPath`).
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    idempotent: HashSet<(Method, String)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `method path` as idempotent.
    pub fn idempotent(mut self, method: Method, path: impl Into<String>) -> Self {
        self.idempotent.insert((method, path.into()));
        self
    }

    pub fn is_idempotent(&self, method: &Method, path: &str) -> bool {
        self.idempotent.contains(&(method.clone(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.idempotent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idempotent.is_empty()
    }
}
