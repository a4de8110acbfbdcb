//! Setup-time registration of routes and hooks.

use crate::handler::{BoxedHandler, EgressHook, ErrorHook, Handler, RoutedHandler};
use crate::http::Method;
use crate::routing::{Resolver, Route, RouteTable};
use std::sync::Arc;
use tracing::{debug, warn};

/// The four optional hook slots. Each holds at most one hook; the last assignment wins.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) ingress: Option<Arc<dyn Handler>>,
    pub(crate) egress: Option<Arc<dyn EgressHook>>,
    pub(crate) not_found: Option<Arc<dyn Handler>>,
    pub(crate) error: Option<Arc<dyn ErrorHook>>,
}

/// Request router wrapping a [`Resolver`] with lifecycle hooks.
///
/// Configure it with `&mut self` methods, then share it (usually in an `Arc`)
/// and call [`ServiceRouter::dispatch`] from as many tasks as needed. Nothing
/// is mutated after setup, so concurrent dispatches never contend.
///
/// ```rust
/// use fezz_router::prelude::*;
///
/// let mut router = ServiceRouter::new();
/// router
///     .get("/hello/:name", handlers![handler_fn(|_req, _env, _ctx, rc| {
///         let name = rc.path_param("name").unwrap_or("world").to_string();
///         Box::pin(async move { Ok(FezzResponse::text(format!("Hello, {}!", name)).into()) })
///     })])
///     .on_not_found(handler_fn(|_, _, _, _| {
///         Box::pin(async { Ok(FezzResponse::plain(StatusCode::NOT_FOUND, "nothing here").into()) })
///     }));
/// ```
pub struct ServiceRouter<R: Resolver = RouteTable> {
    pub(crate) resolver: R,
    pub(crate) hooks: Hooks,
}

impl ServiceRouter<RouteTable> {
    /// Create a router backed by an empty [`RouteTable`].
    pub fn new() -> Self {
        Self::with_resolver(RouteTable::new())
    }

    /// Register a handler chain for `method` and `pattern`.
    pub fn add(
        &mut self,
        method: Method,
        pattern: impl Into<String>,
        handlers: Vec<BoxedHandler>,
    ) -> &mut Self {
        let pattern = pattern.into();
        debug!("Registered route: {} {}", method, pattern);
        self.resolver.add(Route::new(Some(method), pattern, handlers));
        self
    }

    /// Register a handler chain for every method on `pattern`.
    pub fn all(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        let route = Route::new(None, pattern, handlers);
        debug!("Registered route: * {}", route.pattern);
        self.resolver.add(route);
        self
    }

    /// Register a handler chain for every method under the path prefix `prefix`.
    pub fn mount(&mut self, prefix: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        let route = Route::mounted(prefix, handlers);
        debug!("Mounted handlers under: {}", route.pattern);
        self.resolver.add(route);
        self
    }

    /// Register a handler chain for every request; same as mounting at `/`.
    pub fn mount_root(&mut self, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.mount("/", handlers)
    }

    /// Register a macro-generated handler at the method and path in its manifest.
    pub fn route<H: RoutedHandler>(&mut self) -> &mut Self {
        let manifest = H::manifest();
        let handlers: Vec<BoxedHandler> = vec![Arc::new(H::create())];
        debug!("Registering handler '{}'", manifest.name);
        match manifest.route_method() {
            Ok(Some(method)) => self.add(method, manifest.path, handlers),
            Ok(None) => self.all(manifest.path, handlers),
            Err(e) => {
                warn!("Skipping handler '{}': {}", manifest.name, e);
                self
            }
        }
    }

    pub fn get(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.add(Method::Get, pattern, handlers)
    }

    pub fn post(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.add(Method::Post, pattern, handlers)
    }

    pub fn put(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.add(Method::Put, pattern, handlers)
    }

    pub fn patch(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.add(Method::Patch, pattern, handlers)
    }

    pub fn delete(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.add(Method::Delete, pattern, handlers)
    }

    pub fn head(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.add(Method::Head, pattern, handlers)
    }

    pub fn options(&mut self, pattern: impl Into<String>, handlers: Vec<BoxedHandler>) -> &mut Self {
        self.add(Method::Options, pattern, handlers)
    }

    /// Get the registered routes.
    pub fn routes(&self) -> &[Route] {
        self.resolver.list()
    }
}

impl Default for ServiceRouter<RouteTable> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resolver> ServiceRouter<R> {
    /// Create a router over a custom resolver.
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            hooks: Hooks::default(),
        }
    }

    /// Get the resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Set the hook run before route resolution.
    ///
    /// Returning a response from it skips resolution and every handler.
    pub fn on_ingress(&mut self, hook: impl Handler + 'static) -> &mut Self {
        self.hooks.ingress = Some(Arc::new(hook));
        self
    }

    /// Set the hook run after the handler that answered the request.
    pub fn on_egress(&mut self, hook: impl EgressHook + 'static) -> &mut Self {
        self.hooks.egress = Some(Arc::new(hook));
        self
    }

    /// Set the hook run when no handler answered the request.
    pub fn on_not_found(&mut self, hook: impl Handler + 'static) -> &mut Self {
        self.hooks.not_found = Some(Arc::new(hook));
        self
    }

    /// Set the hook run when dispatch failed.
    pub fn on_error(&mut self, hook: impl ErrorHook + 'static) -> &mut Self {
        self.hooks.error = Some(Arc::new(hook));
        self
    }
}

impl<R: Resolver> std::fmt::Debug for ServiceRouter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRouter")
            .field("ingress", &self.hooks.ingress.is_some())
            .field("egress", &self.hooks.egress.is_some())
            .field("not_found", &self.hooks.not_found.is_some())
            .field("error", &self.hooks.error.is_some())
            .finish_non_exhaustive()
    }
}
