//! The per-request dispatch pipeline.
//!
//! Ingress hook, route resolution, handler chain and egress hook run strictly
//! in sequence inside one task. Any failure (or panic) in those stages is
//! contained once and turned into a response by the error stage.

use crate::dispatch::{fallback, ServiceRouter};
use crate::handler::{Environment, ExecutionContext, FezzError, HandlerOutcome, RequestContext};
use crate::http::{FezzRequest, FezzResponse};
use crate::routing::Resolver;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

/// Pipeline stage, tracked so contained failures can say where they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Ingress,
    Resolve,
    HandlerChain,
    Egress,
    NotFound,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Ingress => "ingress",
            Stage::Resolve => "resolve",
            Stage::HandlerChain => "handler chain",
            Stage::Egress => "egress",
            Stage::NotFound => "not found",
        };
        f.write_str(name)
    }
}

impl<R: Resolver> ServiceRouter<R> {
    /// Dispatch a request with a fresh [`RequestContext`].
    ///
    /// See [`ServiceRouter::dispatch_with`].
    pub async fn dispatch(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
    ) -> Result<FezzResponse, FezzError> {
        let mut req_ctx = RequestContext::new();
        self.dispatch_with(request, env, ctx, &mut req_ctx).await
    }

    /// Dispatch a request, enriching a caller-supplied [`RequestContext`].
    ///
    /// Every failure raised by the ingress hook, the resolver, a handler, the
    /// egress hook or the not-found hook is converted into a response, through
    /// the error hook if one is set, otherwise as `500 - <failure>`.
    ///
    /// # Errors
    ///
    /// Only a failure returned by the error hook itself is passed back to the
    /// caller. A panic inside the error hook is not caught either.
    pub async fn dispatch_with(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
    ) -> Result<FezzResponse, FezzError> {
        let mut stage = Stage::Start;
        let outcome = AssertUnwindSafe(self.run(request, env, ctx, req_ctx, &mut stage))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(e)) => e,
            Err(payload) => FezzError::from_panic(payload),
        };

        warn!(
            "Dispatch of {} {} failed during {}: {} [{}]",
            request.method, request.url, stage, failure, ctx.request_id
        );
        self.recover(request, env, ctx, req_ctx, failure).await
    }

    async fn run(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
        stage: &mut Stage,
    ) -> Result<FezzResponse, FezzError> {
        if let Some(ingress) = &self.hooks.ingress {
            *stage = Stage::Ingress;
            if let HandlerOutcome::Terminal(response) =
                ingress.call(request, env, ctx, req_ctx).await?
            {
                debug!("Ingress hook answered request [{}]", ctx.request_id);
                return Ok(response);
            }
        }

        *stage = Stage::Resolve;
        let path = request.path()?;
        let matched = self.resolver.resolve(&request.method, &path).await?;
        debug!(
            "Resolved {} {} to {} handler(s) [{}]",
            request.method,
            path,
            matched.handlers.len(),
            ctx.request_id
        );
        req_ctx.path_params = matched.params;

        *stage = Stage::HandlerChain;
        for (index, handler) in matched.handlers.iter().enumerate() {
            let HandlerOutcome::Terminal(response) =
                handler.call(request, env, ctx, req_ctx).await?
            else {
                continue;
            };
            debug!("Handler #{} answered request [{}]", index, ctx.request_id);

            if let Some(egress) = &self.hooks.egress {
                *stage = Stage::Egress;
                if let HandlerOutcome::Terminal(replacement) =
                    egress.call(request, env, ctx, req_ctx, &response).await?
                {
                    debug!("Egress hook replaced response [{}]", ctx.request_id);
                    return Ok(replacement);
                }
            }
            return Ok(response);
        }

        *stage = Stage::NotFound;
        if let Some(not_found) = &self.hooks.not_found {
            if let HandlerOutcome::Terminal(response) =
                not_found.call(request, env, ctx, req_ctx).await?
            {
                return Ok(response);
            }
        }
        debug!("No handler answered {} [{}]", path, ctx.request_id);
        Ok(fallback::not_found())
    }

    async fn recover(
        &self,
        request: &FezzRequest,
        env: &Environment,
        ctx: &ExecutionContext,
        req_ctx: &mut RequestContext,
        failure: FezzError,
    ) -> Result<FezzResponse, FezzError> {
        if let Some(hook) = &self.hooks.error {
            match hook.call(request, env, ctx, req_ctx, &failure).await {
                Ok(HandlerOutcome::Terminal(response)) => return Ok(response),
                Ok(HandlerOutcome::Continue) => {}
                Err(e) => {
                    error!(
                        "Error hook failed while handling '{}': {} [{}]",
                        failure, e, ctx.request_id
                    );
                    return Err(e);
                }
            }
        }
        Ok(fallback::server_error(&failure))
    }
}
