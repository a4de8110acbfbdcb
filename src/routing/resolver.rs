//! Contract between the dispatch pipeline and whatever maps requests to handlers.

use crate::handler::{BoxedHandler, FezzError};
use crate::http::Method;
use async_trait::async_trait;
use std::collections::HashMap;

/// Handlers and path parameters resolved for one request.
#[derive(Clone, Default)]
pub struct MatchResult {
    /// Handlers to run, in registration order. Empty when nothing matched.
    pub handlers: Vec<BoxedHandler>,
    /// Parameters captured from the path.
    pub params: HashMap<String, String>,
}

impl MatchResult {
    /// Create an empty match result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether no handler matched.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchResult")
            .field("handlers", &self.handlers.len())
            .field("params", &self.params)
            .finish()
    }
}

/// Maps a method and path to a handler chain.
///
/// An unmatched path must resolve to an empty [`MatchResult`]. `Err` is kept
/// for resolvers that can genuinely fail (remote tables, corrupt state) and is
/// handled as a dispatch failure, never as not-found.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, method: &Method, path: &str) -> Result<MatchResult, FezzError>;
}
