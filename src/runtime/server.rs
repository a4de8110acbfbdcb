//! HTTP host calling the dispatch pipeline once per request.

use crate::dispatch::ServiceRouter;
use crate::handler::{Environment, ExecutionContext};
use crate::http::{FezzRequest, FezzResponse, Method, StatusCode};
use crate::routing::{Resolver, RouteTable};
use crate::runtime::ServerConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Error raised while turning a hyper request into a [`FezzRequest`].
type ConvertError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP server hosting a [`ServiceRouter`].
///
/// Each connection runs on its own tokio task; each request gets a fresh
/// [`ExecutionContext`] whose cancellation token fires after the configured
/// request timeout.
pub struct RouterServer<R: Resolver + 'static = RouteTable> {
    config: ServerConfig,
    router: Arc<ServiceRouter<R>>,
    env: Environment,
}

impl<R: Resolver + 'static> RouterServer<R> {
    /// Create a new server. Variables from `config.env` seed the environment.
    pub fn new(config: ServerConfig, router: ServiceRouter<R>) -> Self {
        let env = Environment::from_vars(config.env.clone());
        Self {
            config,
            router: Arc::new(router),
            env,
        }
    }

    /// Replace the environment handed to every request, keeping config variables.
    pub fn with_environment(mut self, mut env: Environment) -> Self {
        for (k, v) in &self.config.env {
            env.vars.entry(k.clone()).or_insert_with(|| v.clone());
        }
        self.env = env;
        self
    }

    /// Get the router.
    pub fn router(&self) -> Arc<ServiceRouter<R>> {
        self.router.clone()
    }

    /// Start the HTTP server.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("Router listening on {}", addr);

        let server = Arc::new(self);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = server.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.serve(req, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, service)
                    .await
                {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }

    async fn serve(
        &self,
        req: Request<Incoming>,
        remote_addr: SocketAddr,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        debug!("Handling request: {} {} from {}", req.method(), req.uri(), remote_addr);

        if self.config.enable_health && req.uri().path() == "/_health" {
            return Ok(build_response(FezzResponse::text("OK")));
        }

        let request = match convert_request(req, self.config.max_body_size).await {
            Ok(request) => request,
            Err(e) if e.is::<http_body_util::LengthLimitError>() => {
                return Ok(build_response(FezzResponse::error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Request body too large",
                )));
            }
            Err(e) => {
                warn!("Failed to convert request: {}", e);
                return Ok(build_response(FezzResponse::error(
                    StatusCode::BAD_REQUEST,
                    e.to_string(),
                )));
            }
        };

        Ok(build_response(self.handle(request).await))
    }

    /// Dispatch one request with a fresh execution context.
    ///
    /// A failure escaping the pipeline (from the error hook) is logged and
    /// answered with a bare 500.
    pub async fn handle(&self, request: FezzRequest) -> FezzResponse {
        let ctx = ExecutionContext::new(generate_request_id());

        let deadline = {
            let token = ctx.cancellation_token().clone();
            let timeout = self.config.timeout();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                token.cancel();
            })
        };

        let result = self.router.dispatch(&request, &self.env, &ctx).await;
        deadline.abort();

        match result {
            Ok(response) => {
                debug!(
                    "{} {} -> {} [{}]",
                    request.method, request.url, response.status.0, ctx.request_id
                );
                response
            }
            Err(e) => {
                error!(
                    "Unhandled failure for {} {}: {} [{}]",
                    request.method, request.url, e, ctx.request_id
                );
                FezzResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// Convert a hyper Request to FezzRequest.
async fn convert_request(
    req: Request<Incoming>,
    max_body_size: usize,
) -> Result<FezzRequest, ConvertError> {
    let method = Method::from(req.method());

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let authority = req
        .uri()
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            req.headers()
                .get(hyper::header::HOST)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "localhost".to_string());
    let url = format!("http://{}{}", authority, path_and_query);

    let mut headers = HashMap::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let body_bytes = Limited::new(req.into_body(), max_body_size)
        .collect()
        .await?
        .to_bytes();
    let body = if body_bytes.is_empty() {
        None
    } else {
        Some(body_bytes)
    };

    Ok(FezzRequest {
        method,
        url,
        headers,
        body,
    })
}

/// Build a hyper Response from FezzResponse.
fn build_response(fezz_response: FezzResponse) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(fezz_response.status.0).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            fezz_response.status.0
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);

    for (name, value) in fezz_response.headers {
        builder = builder.header(name, value);
    }

    let body = fezz_response.body.unwrap_or_default();
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        warn!("Invalid response header, dropping response: {}", e);
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Generate a unique request ID.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", timestamp, seq)
}
