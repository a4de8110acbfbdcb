//! # Fezz Router - request dispatch for Fezz edge functions
//!
//! Fezz Router decides which code answers an HTTP request and what happens
//! when nothing does or something fails. A request runs through a fixed
//! pipeline:
//!
//! ```text
//!   ingress hook ──► resolve (method, path) ──► handler chain ──► egress hook
//!        │                                          │
//!        │ response                                 │ exhausted
//!        ▼                                          ▼
//!     answered                               not-found hook ──► 404
//!
//!   any failure or panic above ──► error hook ──► 500
//! ```
//!
//! Every stage may suspend. Exactly one response comes out of each dispatch.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fezz_router::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut router = ServiceRouter::new();
//!     router
//!         .get("/hello", handlers![handler_fn(|_req, _env, _ctx, _rc| {
//!             Box::pin(async { Ok(FezzResponse::text("Hello from Fezz!").into()) })
//!         })])
//!         .on_ingress(handler_fn(|req, _env, _ctx, _rc| {
//!             let authorized = req.get_header("Authorization").is_some();
//!             Box::pin(async move {
//!                 if authorized {
//!                     Ok(HandlerOutcome::Continue)
//!                 } else {
//!                     Ok(FezzResponse::error(StatusCode::UNAUTHORIZED, "unauthorized").into())
//!                 }
//!             })
//!         }));
//!
//!     RouterServer::new(ServerConfig::from_env(), router).run().await
//! }
//! ```
//!
//! ## Hooks
//!
//! 1. **Ingress**: runs before resolution; a response short-circuits everything else.
//! 2. **Egress**: runs after the handler that answered; a response replaces the handler's.
//! 3. **Not found**: runs when the handler chain is exhausted; otherwise `404 - Resource not found`.
//! 4. **Error**: runs when any stage fails; otherwise `500 - <failure>`.

pub mod dispatch;
pub mod handler;
pub mod http;
pub mod routing;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::dispatch::ServiceRouter;
    pub use crate::handler::{
        egress_fn, error_fn, handler_fn, BoxedHandler, EgressHook, Environment, ErrorHook,
        ExecutionContext, FezzError, Handler, HandlerOutcome, HandlerResult, RequestContext,
        RoutedHandler,
    };
    pub use crate::handlers;
    pub use crate::http::{FezzRequest, FezzResponse, Method, StatusCode};
    pub use crate::routing::{MatchResult, Resolver, RouteTable};
    pub use crate::runtime::{RouterServer, ServerConfig};
    pub use async_trait::async_trait;
    pub use fezz_router_macro::fezz_handler;
    pub use futures::future::BoxFuture;
}

// Re-export for convenience
pub use dispatch::ServiceRouter;
pub use handler::{FezzError, HandlerOutcome, RequestContext};
pub use http::{FezzRequest, FezzResponse};
pub use runtime::{RouterServer, ServerConfig};
