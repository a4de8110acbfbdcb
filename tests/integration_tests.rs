//! Integration tests for the Fezz dispatch pipeline.

use fezz_router::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records the order in which handlers and hooks ran.
#[derive(Clone, Default)]
struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    fn push(&self, step: impl Into<String>) {
        self.0.lock().unwrap().push(step.into());
    }

    fn steps(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A handler that records itself and continues.
fn pass(trace: &Trace, name: &'static str) -> impl Handler {
    let trace = trace.clone();
    handler_fn(move |_, _, _, _| {
        trace.push(name);
        Box::pin(async { Ok(HandlerOutcome::Continue) })
    })
}

/// A handler that records itself and answers.
fn answer(trace: &Trace, name: &'static str, status: u16, body: &'static str) -> impl Handler {
    let trace = trace.clone();
    handler_fn(move |_, _, _, _| {
        trace.push(name);
        Box::pin(async move { Ok(FezzResponse::text(body).with_status(status).into()) })
    })
}

fn get(path: &str) -> FezzRequest {
    FezzRequest::new(Method::Get, format!("https://worker.example.com{}", path))
}

async fn dispatch(router: &ServiceRouter, request: &FezzRequest) -> FezzResponse {
    router
        .dispatch(request, &Environment::new(), &ExecutionContext::new("req-test"))
        .await
        .expect("dispatch should not fail outward")
}

#[tokio::test]
async fn test_chain_continues_until_a_handler_answers() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router.get(
        "/",
        handlers![pass(&trace, "h1"), answer(&trace, "h2", 200, "ok")],
    );

    let response = dispatch(&router, &get("/")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text_body(), Some("ok".to_string()));
    assert_eq!(trace.steps(), vec!["h1", "h2"]);
}

#[tokio::test]
async fn test_single_termination_skips_later_handlers() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router
        .mount_root(handlers![pass(&trace, "mw")])
        .get(
            "/items/:id",
            handlers![
                pass(&trace, "h1"),
                answer(&trace, "h2", 201, "created"),
                answer(&trace, "h3", 200, "never"),
            ],
        )
        .all("/items/:id", handlers![answer(&trace, "h4", 200, "never")]);

    let response = dispatch(&router, &get("/items/5")).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.text_body(), Some("created".to_string()));
    assert_eq!(trace.steps(), vec!["mw", "h1", "h2"]);
}

#[tokio::test]
async fn test_resolver_params_overwrite_ingress_params() {
    let seen = Arc::new(Mutex::new(None));
    let mut router = ServiceRouter::new();
    router
        .on_ingress(handler_fn(|_, _, _, rc| {
            Box::pin(async move {
                rc.path_params.clear();
                rc.path_params.insert("id".into(), "from-ingress".into());
                rc.path_params.insert("stale".into(), "x".into());
                Ok(HandlerOutcome::Continue)
            })
        }))
        .get("/users/:id", {
            let seen = seen.clone();
            handlers![handler_fn(move |_, _, _, rc| {
                *seen.lock().unwrap() = Some(rc.path_params.clone());
                Box::pin(async { Ok(FezzResponse::ok().into()) })
            })]
        });

    dispatch(&router, &get("/users/42")).await;

    let params = seen.lock().unwrap().clone().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params.get("id"), Some(&"42".to_string()));
}

#[tokio::test]
async fn test_path_params_overwritten_even_when_route_has_none() {
    let mut router = ServiceRouter::new();
    router.get("/plain", handlers![handler_fn(|_, _, _, rc| {
        let count = rc.path_params.len();
        Box::pin(async move { Ok(FezzResponse::text(count.to_string()).into()) })
    })]);

    let mut seed = RequestContext::new();
    seed.path_params.insert("leftover".into(), "1".into());

    let response = router
        .dispatch_with(&get("/plain"), &Environment::new(), &ExecutionContext::default(), &mut seed)
        .await
        .unwrap();

    assert_eq!(response.text_body(), Some("0".to_string()));
    assert!(seed.path_params.is_empty());
}

#[tokio::test]
async fn test_ingress_short_circuit_skips_resolution_and_handlers() {
    struct CountingResolver {
        calls: AtomicUsize,
        inner: RouteTable,
    }

    #[async_trait]
    impl Resolver for CountingResolver {
        async fn resolve(&self, method: &Method, path: &str) -> Result<MatchResult, FezzError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(method, path).await
        }
    }

    let trace = Trace::default();
    let mut table = RouteTable::new();
    table.add(fezz_router::routing::Route::new(
        None,
        "/",
        handlers![answer(&trace, "handler", 200, "handled")],
    ));

    let mut router = ServiceRouter::with_resolver(CountingResolver {
        calls: AtomicUsize::new(0),
        inner: table,
    });
    router
        .on_ingress(handler_fn(|_, _, _, _| {
            Box::pin(async { Ok(FezzResponse::error(StatusCode::TOO_MANY_REQUESTS, "slow down").into()) })
        }))
        .on_egress(egress_fn(|_, _, _, _, _| {
            Box::pin(async { Ok(FezzResponse::text("egress").into()) })
        }));

    let response = router
        .dispatch(&get("/"), &Environment::new(), &ExecutionContext::default())
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.text_body(), Some("slow down".to_string()));
    assert_eq!(router.resolver().calls.load(Ordering::SeqCst), 0);
    assert!(trace.steps().is_empty());
}

#[tokio::test]
async fn test_egress_replaces_response() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router
        .get("/", handlers![answer(&trace, "h", 200, "A")])
        .on_egress(egress_fn(|_, _, _, _, response| {
            let rewritten = FezzResponse::text(format!("{}+B", response.text_body().unwrap_or_default()))
                .with_status(StatusCode(202));
            Box::pin(async move { Ok(rewritten.into()) })
        }));

    let response = dispatch(&router, &get("/")).await;

    assert_eq!(response.status.0, 202);
    assert_eq!(response.text_body(), Some("A+B".to_string()));
}

#[tokio::test]
async fn test_egress_continue_keeps_original_response() {
    let trace = Trace::default();
    let egress_calls = Arc::new(AtomicUsize::new(0));
    let mut router = ServiceRouter::new();
    router
        .get("/", handlers![pass(&trace, "h1"), answer(&trace, "h2", 200, "A")])
        .on_egress({
            let egress_calls = egress_calls.clone();
            egress_fn(move |_, _, _, _, _| {
                egress_calls.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(HandlerOutcome::Continue) })
            })
        });

    let response = dispatch(&router, &get("/")).await;

    assert_eq!(response.text_body(), Some("A".to_string()));
    assert_eq!(egress_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_egress_not_run_when_nothing_answers() {
    let egress_calls = Arc::new(AtomicUsize::new(0));
    let mut router = ServiceRouter::new();
    router.on_egress({
        let egress_calls = egress_calls.clone();
        egress_fn(move |_, _, _, _, _| {
            egress_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(HandlerOutcome::Continue) })
        })
    });

    let response = dispatch(&router, &get("/nowhere")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(egress_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_default_not_found() {
    let router = ServiceRouter::new();

    let response = dispatch(&router, &get("/missing")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text_body(), Some("404 - Resource not found".to_string()));
    assert_eq!(
        response.headers.get("Content-Type"),
        Some(&"text/plain; charset=utf-8".to_string())
    );
}

#[tokio::test]
async fn test_not_found_when_chain_exhausted() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router.get("/soft", handlers![pass(&trace, "h1"), pass(&trace, "h2")]);

    let response = dispatch(&router, &get("/soft")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(trace.steps(), vec!["h1", "h2"]);
}

#[tokio::test]
async fn test_not_found_hook_answers_or_declines() {
    let mut router = ServiceRouter::new();
    router.on_not_found(handler_fn(|req, _, _, _| {
        let custom = req.url.ends_with("/custom");
        Box::pin(async move {
            if custom {
                Ok(FezzResponse::plain(StatusCode(410), "gone").into())
            } else {
                Ok(HandlerOutcome::Continue)
            }
        })
    }));

    let response = dispatch(&router, &get("/custom")).await;
    assert_eq!(response.status.0, 410);
    assert_eq!(response.text_body(), Some("gone".to_string()));

    let response = dispatch(&router, &get("/other")).await;
    assert_eq!(response.text_body(), Some("404 - Resource not found".to_string()));
}

#[tokio::test]
async fn test_default_server_error() {
    let mut router = ServiceRouter::new();
    router.get("/", handlers![handler_fn(|_, _, _, _| {
        Box::pin(async { Err(FezzError::new("boom")) })
    })]);

    let response = dispatch(&router, &get("/")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text_body(), Some("500 - boom".to_string()));
    assert_eq!(
        response.headers.get("Content-Type"),
        Some(&"text/plain; charset=utf-8".to_string())
    );
}

#[tokio::test]
async fn test_error_hook_answers() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router
        .get(
            "/",
            handlers![
                handler_fn(|_, _, _, _| Box::pin(async { Err(FezzError::new("boom")) })),
                answer(&trace, "after", 200, "never"),
            ],
        )
        .on_error(error_fn(|_, _, _, _, err| {
            let matched = err.to_string() == "boom";
            Box::pin(async move {
                assert!(matched);
                Ok(FezzResponse::plain(StatusCode::SERVICE_UNAVAILABLE, "retry").into())
            })
        }));

    let response = dispatch(&router, &get("/")).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.text_body(), Some("retry".to_string()));
    assert!(trace.steps().is_empty());
}

#[tokio::test]
async fn test_error_hook_declining_falls_back_to_default() {
    let mut router = ServiceRouter::new();
    router
        .on_ingress(handler_fn(|_, _, _, _| {
            Box::pin(async { Err(FezzError::new("auth backend down")) })
        }))
        .on_error(error_fn(|_, _, _, _, _| Box::pin(async { Ok(HandlerOutcome::Continue) })));

    let response = dispatch(&router, &get("/")).await;

    assert_eq!(response.text_body(), Some("500 - auth backend down".to_string()));
}

#[tokio::test]
async fn test_repeat_dispatch_is_stable() {
    let mut router = ServiceRouter::new();
    router
        .mount_root(handlers![handler_fn(|_, _, _, rc| {
            Box::pin(async move {
                let visits = rc.get("visits").and_then(|v| v.as_u64()).unwrap_or(0);
                rc.set("visits", visits + 1);
                Ok(HandlerOutcome::Continue)
            })
        })])
        .get("/count/:id", handlers![handler_fn(|_, _, _, rc| {
            let body = format!("{}:{}", rc.path_param("id").unwrap_or(""), rc.get("visits").cloned().unwrap_or_default());
            Box::pin(async move { Ok(FezzResponse::text(body).into()) })
        })]);

    let request = get("/count/7");
    let first = dispatch(&router, &request).await;
    let second = dispatch(&router, &request).await;

    assert_eq!(first, second);
    assert_eq!(first.text_body(), Some("7:1".to_string()));
}

#[tokio::test]
async fn test_seeded_context_is_enriched() {
    let mut router = ServiceRouter::new();
    router.get("/t/:tenant", handlers![handler_fn(|_, _, _, rc| {
        let greeting = format!("{} via {}", rc.path_param("tenant").unwrap_or(""), rc.get_str("edge").unwrap_or(""));
        Box::pin(async move {
            rc.set("answered", true);
            Ok(FezzResponse::text(greeting).into())
        })
    })]);

    let mut seed = RequestContext::new().with("edge", "fra1");
    let response = router
        .dispatch_with(&get("/t/acme"), &Environment::new(), &ExecutionContext::default(), &mut seed)
        .await
        .unwrap();

    assert_eq!(response.text_body(), Some("acme via fra1".to_string()));
    assert_eq!(seed.path_param("tenant"), Some("acme"));
    assert_eq!(seed.get("answered"), Some(&serde_json::Value::Bool(true)));
    assert_eq!(seed.get_str("edge"), Some("fra1"));
}

#[tokio::test]
async fn test_handlers_observe_environment_and_suspend() {
    let mut router = ServiceRouter::new();
    router.get("/slow", handlers![handler_fn(|_, env, _, _| {
        let region = env.var("REGION").cloned().unwrap_or_default();
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            Ok(FezzResponse::text(region).into())
        })
    })]);

    let env = Environment::new().with_var("REGION", "eu-west");
    let response = router
        .dispatch(&get("/slow"), &env, &ExecutionContext::default())
        .await
        .unwrap();

    assert_eq!(response.text_body(), Some("eu-west".to_string()));
}

#[tokio::test]
async fn test_concurrent_dispatches_are_independent() {
    let mut router = ServiceRouter::new();
    router.get("/echo/:n", handlers![handler_fn(|_, _, _, rc| {
        let n: u64 = rc.path_param("n").and_then(|n| n.parse().ok()).unwrap_or(0);
        Box::pin(async move {
            rc.set("n", n);
            tokio::time::sleep(std::time::Duration::from_millis(10 - n % 10)).await;
            let echoed = rc.get("n").and_then(|v| v.as_u64()).unwrap_or(u64::MAX);
            Ok(FezzResponse::text(echoed.to_string()).into())
        })
    })]);
    let router = Arc::new(router);

    let tasks: Vec<_> = (0..20u64)
        .map(|n| {
            let router = router.clone();
            tokio::spawn(async move {
                let response = router
                    .dispatch(&get(&format!("/echo/{}", n)), &Environment::new(), &ExecutionContext::default())
                    .await
                    .unwrap();
                (n, response.text_body())
            })
        })
        .collect();

    for task in tasks {
        let (n, body) = task.await.unwrap();
        assert_eq!(body, Some(n.to_string()));
    }
}

#[tokio::test]
async fn test_background_work_via_execution_context() {
    let done = Arc::new(AtomicUsize::new(0));
    let mut router = ServiceRouter::new();
    router.post("/log", {
        let done = done.clone();
        handlers![handler_fn(move |_, _, ctx, _| {
            let done = done.clone();
            ctx.wait_until(async move {
                done.fetch_add(1, Ordering::SeqCst);
            });
            Box::pin(async { Ok(FezzResponse::new(StatusCode::NO_CONTENT).into()) })
        })]
    });

    let ctx = ExecutionContext::new("bg");
    let response = router
        .dispatch(&FezzRequest::new(Method::Post, "/log"), &Environment::new(), &ctx)
        .await
        .unwrap();
    ctx.drain().await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_head_request_served_by_get_route() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router.get("/page", handlers![answer(&trace, "get", 200, "page")]);

    let response = dispatch(&router, &FezzRequest::new(Method::Head, "/page")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(trace.steps(), vec!["get"]);
}

#[tokio::test]
async fn test_extension_method_reaches_not_found_hook() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router
        .get("/cache", handlers![answer(&trace, "get", 200, "cached")])
        .on_not_found(pass(&trace, "not-found"));

    let purge: Method = "PURGE".parse().unwrap();
    let response = dispatch(&router, &FezzRequest::new(purge, "/cache")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text_body(), Some("404 - Resource not found".to_string()));
    assert_eq!(trace.steps(), vec!["not-found"]);
}

#[tokio::test]
async fn test_extension_method_route() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router.add(
        Method::Other("PURGE".into()),
        "/cache/:key",
        handlers![answer(&trace, "purge", 202, "purged")],
    );

    let request = FezzRequest::new(Method::Other("PURGE".into()), "/cache/logo");
    let response = dispatch(&router, &request).await;
    assert_eq!(response.status.0, 202);

    let response = dispatch(&router, &get("/cache/logo")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(trace.steps(), vec!["purge"]);
}

#[tokio::test]
async fn test_empty_segment_does_not_bind_required_param() {
    let trace = Trace::default();
    let mut router = ServiceRouter::new();
    router.get("/users/:id/posts", handlers![answer(&trace, "posts", 200, "posts")]);

    let response = dispatch(&router, &get("/users//posts")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(trace.steps().is_empty());
}

#[fezz_handler(method = "GET", path = "/api/users/:id", description = "Fetch a user")]
async fn get_user(
    _req: &FezzRequest,
    _env: &Environment,
    _ctx: &ExecutionContext,
    rc: &mut RequestContext,
) -> HandlerResult {
    let id = rc.path_param("id").unwrap_or_default().to_string();
    Ok(FezzResponse::json(&serde_json::json!({ "id": id }))?.into())
}

#[fezz_handler(name = "catch-all", method = "*", path = "/any")]
async fn any_method(
    req: &FezzRequest,
    _env: &Environment,
    _ctx: &ExecutionContext,
    _rc: &mut RequestContext,
) -> HandlerResult {
    Ok(FezzResponse::text(req.method.to_string()).into())
}

#[test]
fn test_macro_manifest() {
    let manifest = GetUserHandler::manifest();
    assert_eq!(manifest.name, "get_user");
    assert_eq!(manifest.method, "GET");
    assert_eq!(manifest.path, "/api/users/:id");
    assert_eq!(manifest.description, "Fetch a user");

    let manifest = AnyMethodHandler::manifest();
    assert_eq!(manifest.name, "catch-all");
    assert_eq!(manifest.method, "*");
}

#[tokio::test]
async fn test_macro_handlers_route_and_execute() {
    let mut router = ServiceRouter::new();
    router.route::<GetUserHandler>().route::<AnyMethodHandler>();

    let response = dispatch(&router, &get("/api/users/ada")).await;
    assert_eq!(response.get_header("content-type"), Some(&"application/json".to_string()));
    let body: serde_json::Value = response.json_body().unwrap().unwrap();
    assert_eq!(body["id"], "ada");

    let response = dispatch(&router, &FezzRequest::new(Method::Delete, "/any")).await;
    assert_eq!(response.text_body(), Some("DELETE".to_string()));
}
