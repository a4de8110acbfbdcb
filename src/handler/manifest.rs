//! Compile-time route metadata for handlers.
//!
//! The `#[fezz_handler]` attribute generates a manifest for each handler so
//! it can be registered on a router without repeating its method and path.

use crate::handler::{FezzError, Handler};
use crate::http::Method;
use serde::Serialize;

/// Route metadata attached to a handler.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerManifest {
    /// Handler name, used in logs.
    pub name: &'static str,
    /// Upper-case HTTP method name, or `*` for every method.
    pub method: &'static str,
    /// Route pattern, e.g. `/api/users/:id`.
    pub path: &'static str,
    /// Optional description of the handler.
    pub description: &'static str,
}

impl HandlerManifest {
    /// Create a new handler manifest.
    pub const fn new(name: &'static str, method: &'static str, path: &'static str) -> Self {
        Self {
            name,
            method,
            path,
            description: "",
        }
    }

    /// Create a manifest with description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Parse the method name; `None` stands for every method.
    pub fn route_method(&self) -> Result<Option<Method>, FezzError> {
        match self.method {
            "*" => Ok(None),
            name => name.parse().map(Some),
        }
    }
}

impl Default for HandlerManifest {
    fn default() -> Self {
        Self::new("", "GET", "/")
    }
}

/// A handler that knows where it should be routed.
pub trait RoutedHandler: Handler + 'static {
    /// Get the handler manifest.
    fn manifest() -> &'static HandlerManifest
    where
        Self: Sized;

    /// Create the handler instance registered on the router.
    fn create() -> Self
    where
        Self: Sized;
}
