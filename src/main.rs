//! Fezz Router - example edge server
//!
//! Demonstrates a router with all four hooks served over HTTP.

use fezz_router::prelude::*;
use tracing_subscriber::EnvFilter;

/// Greets the caller by the `name` path parameter.
#[fezz_handler(method = "GET", path = "/hello/:name", description = "Greeting")]
async fn hello(
    req: &FezzRequest,
    _env: &Environment,
    ctx: &ExecutionContext,
    rc: &mut RequestContext,
) -> HandlerResult {
    let response_body = serde_json::json!({
        "message": format!("Hello, {}!", rc.path_param("name").unwrap_or("World")),
        "method": req.method.to_string(),
        "user": rc.get_str("user"),
        "request_id": ctx.request_id,
    });

    Ok(FezzResponse::json(&response_body)?.into())
}

/// Echoes the request body back.
#[fezz_handler(method = "POST", path = "/echo")]
async fn echo(
    req: &FezzRequest,
    _env: &Environment,
    _ctx: &ExecutionContext,
    _rc: &mut RequestContext,
) -> HandlerResult {
    Ok(FezzResponse::text(req.text().unwrap_or_default()).into())
}

/// Always fails; shows the error hook at work.
#[fezz_handler(method = "*", path = "/fail")]
async fn fail(
    _req: &FezzRequest,
    _env: &Environment,
    _ctx: &ExecutionContext,
    _rc: &mut RequestContext,
) -> HandlerResult {
    Err(FezzError::new("this route always fails"))
}

fn build_router() -> ServiceRouter {
    let mut router = ServiceRouter::new();

    router
        .mount_root(handlers![handler_fn(|req, _env, _ctx, rc| {
            let user = req.get_header("X-User").cloned().unwrap_or_else(|| "anonymous".into());
            Box::pin(async move {
                rc.set("user", user);
                Ok(HandlerOutcome::Continue)
            })
        })])
        .route::<HelloHandler>()
        .route::<EchoHandler>()
        .route::<FailHandler>()
        .on_ingress(handler_fn(|req, env, _ctx, _rc| {
            let blocked = match (env.var("API_KEY"), req.get_header("X-Api-Key")) {
                (Some(expected), Some(given)) => expected != given,
                (Some(_), None) => true,
                (None, _) => false,
            };
            Box::pin(async move {
                if blocked {
                    Ok(FezzResponse::error(StatusCode::UNAUTHORIZED, "401 - Unauthorized").into())
                } else {
                    Ok(HandlerOutcome::Continue)
                }
            })
        }))
        .on_egress(egress_fn(|_req, _env, ctx, _rc, response| {
            let tagged = response.clone().header("X-Request-Id", ctx.request_id.clone());
            Box::pin(async move { Ok(tagged.into()) })
        }))
        .on_not_found(handler_fn(|req, _env, _ctx, _rc| {
            let body = serde_json::json!({ "error": "not found", "url": req.url });
            Box::pin(async move {
                let response = FezzResponse::json(&body)?.with_status(StatusCode::NOT_FOUND);
                Ok::<HandlerOutcome, FezzError>(response.into())
            })
        }))
        .on_error(error_fn(|_req, _env, ctx, _rc, err| {
            tracing::error!("Request failed: {} [{}]", err, ctx.request_id);
            Box::pin(async { Ok(HandlerOutcome::Continue) })
        }));

    router
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Fezz router...");

    let config = ServerConfig::from_env().env("ENVIRONMENT", "development");
    let router = build_router();

    for route in router.routes() {
        let method = route.method.as_ref().map_or("*".to_string(), |m| m.to_string());
        tracing::info!("Route: {} {}", method, route.pattern);
    }
    tracing::info!("Try: curl http://localhost:{}/hello/fezz", config.port);
    tracing::info!("Try: curl -X POST -d 'test' http://localhost:{}/echo", config.port);
    tracing::info!("Health check: curl http://localhost:{}/_health", config.port);

    RouterServer::new(config, router).run().await
}
