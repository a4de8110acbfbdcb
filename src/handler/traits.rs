//! Handler and hook traits.

use crate::handler::{Environment, ExecutionContext, FezzError, RequestContext};
use crate::http::{FezzRequest, FezzResponse};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// What a hook or handler decided about the request.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// The request is answered; dispatch ends with this response.
    Terminal(FezzResponse),
    /// Not answered here; dispatch moves on to the next stage.
    Continue,
}

impl HandlerOutcome {
    /// Check whether the outcome ends dispatch.
    pub fn is_terminal(&self) -> bool {
        matches!(self, HandlerOutcome::Terminal(_))
    }

    /// Take the response out of a terminal outcome.
    pub fn into_response(self) -> Option<FezzResponse> {
        match self {
            HandlerOutcome::Terminal(response) => Some(response),
            HandlerOutcome::Continue => None,
        }
    }
}

impl From<FezzResponse> for HandlerOutcome {
    fn from(response: FezzResponse) -> Self {
        HandlerOutcome::Terminal(response)
    }
}

impl From<Option<FezzResponse>> for HandlerOutcome {
    fn from(response: Option<FezzResponse>) -> Self {
        response.map_or(HandlerOutcome::Continue, HandlerOutcome::Terminal)
    }
}

/// Result of invoking a hook or handler. `Err` is a failure for the error stage.
pub type HandlerResult = Result<HandlerOutcome, FezzError>;

/// A route handler. Also the shape of the ingress and not-found hooks.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
    ) -> HandlerResult;
}

/// Post-handler hook; sees the response that terminated the handler chain.
///
/// Returning `Terminal` replaces that response, `Continue` keeps it.
#[async_trait]
pub trait EgressHook: Send + Sync {
    async fn call(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
        response: &FezzResponse,
    ) -> HandlerResult;
}

/// Error fallback hook; sees the failure that stopped dispatch.
///
/// A failure returned from this hook is not contained by the pipeline.
#[async_trait]
pub trait ErrorHook: Send + Sync {
    async fn call(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
        error: &FezzError,
    ) -> HandlerResult;
}

/// Shared, type-erased handler as stored in route tables.
pub type BoxedHandler = Arc<dyn Handler>;

/// Closure-backed [`Handler`], built with [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
}

/// Closure-backed [`EgressHook`], built with [`egress_fn`].
pub struct EgressFn<F> {
    f: F,
}

/// Closure-backed [`ErrorHook`], built with [`error_fn`].
pub struct ErrorFn<F> {
    f: F,
}

/// Wrap a closure returning a boxed future as a [`Handler`].
///
/// ```rust
/// use fezz_router::prelude::*;
///
/// let hello = handler_fn(|_req, _env, _ctx, _rc| {
///     Box::pin(async move { Ok(FezzResponse::text("hello").into()) })
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(
            &'a FezzRequest,
            &'a Environment,
            &'a ExecutionContext,
            &'a mut RequestContext,
        ) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    HandlerFn { f }
}

/// Wrap a closure returning a boxed future as an [`EgressHook`].
pub fn egress_fn<F>(f: F) -> EgressFn<F>
where
    F: for<'a> Fn(
            &'a FezzRequest,
            &'a Environment,
            &'a ExecutionContext,
            &'a mut RequestContext,
            &'a FezzResponse,
        ) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    EgressFn { f }
}

/// Wrap a closure returning a boxed future as an [`ErrorHook`].
pub fn error_fn<F>(f: F) -> ErrorFn<F>
where
    F: for<'a> Fn(
            &'a FezzRequest,
            &'a Environment,
            &'a ExecutionContext,
            &'a mut RequestContext,
            &'a FezzError,
        ) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    ErrorFn { f }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(
            &'a FezzRequest,
            &'a Environment,
            &'a ExecutionContext,
            &'a mut RequestContext,
        ) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    async fn call(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
    ) -> HandlerResult {
        (self.f)(request, env, ctx, req_ctx).await
    }
}

#[async_trait]
impl<F> EgressHook for EgressFn<F>
where
    F: for<'a> Fn(
            &'a FezzRequest,
            &'a Environment,
            &'a ExecutionContext,
            &'a mut RequestContext,
            &'a FezzResponse,
        ) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    async fn call(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
        response: &FezzResponse,
    ) -> HandlerResult {
        (self.f)(request, env, ctx, req_ctx, response).await
    }
}

#[async_trait]
impl<F> ErrorHook for ErrorFn<F>
where
    F: for<'a> Fn(
            &'a FezzRequest,
            &'a Environment,
            &'a ExecutionContext,
            &'a mut RequestContext,
            &'a FezzError,
        ) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
{
    async fn call(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
        error: &FezzError,
    ) -> HandlerResult {
        (self.f)(request, env, ctx, req_ctx, error).await
    }
}

/// Build a `Vec<BoxedHandler>` from handler values.
///
/// ```rust
/// use fezz_router::prelude::*;
///
/// let chain = handlers![
///     handler_fn(|_, _, _, _| Box::pin(async { Ok(HandlerOutcome::Continue) })),
///     handler_fn(|_, _, _, _| Box::pin(async { Ok(FezzResponse::ok().into()) })),
/// ];
/// assert_eq!(chain.len(), 2);
/// ```
#[macro_export]
macro_rules! handlers {
    ($($handler:expr),* $(,)?) => {
        vec![$(::std::sync::Arc::new($handler) as $crate::handler::BoxedHandler),*]
    };
}
