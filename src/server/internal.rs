//! Internal HTTP server for probe and metrics endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming as IncomingBody;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::handler::{HealthHandler, ResponseFormatter, StatusConvention};
use crate::health::{Inspector, ProbeGroup};

/// Routes probe paths to handlers and serves `/metrics`.
#[derive(Default)]
pub struct ProbeRouter {
    routes: Vec<(String, HealthHandler)>,
    registry: Option<Registry>,
}

impl ProbeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `/healthz/startup` and `/healthz/live` pass when any dependency in the
    /// group is healthy, `/healthz/ready` only when all are.
    pub fn standard(inspector: &Arc<Inspector>, formatter: Option<ResponseFormatter>) -> Self {
        Self::new()
            .route(
                "/healthz/startup",
                inspector.health_handler(ProbeGroup::STARTUP, false, formatter.clone()),
            )
            .route(
                "/healthz/live",
                inspector.health_handler(ProbeGroup::LIVE, false, formatter.clone()),
            )
            .route(
                "/healthz/ready",
                inspector.health_handler(ProbeGroup::READY, true, formatter),
            )
    }

    pub fn route(mut self, path: impl Into<String>, handler: HealthHandler) -> Self {
        self.routes.push((path.into(), handler));
        self
    }

    /// Apply `convention` to every route added so far.
    pub fn with_status_convention(mut self, convention: StatusConvention) -> Self {
        self.routes = self
            .routes
            .into_iter()
            .map(|(path, handler)| (path, handler.with_status_convention(convention)))
            .collect();
        self
    }

    /// Expose `registry` on `/metrics`.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Dispatch on the request path.
    pub fn handle<B>(&self, req: &Request<B>) -> Response<Full<Bytes>> {
        let path = req.uri().path();

        if let Some((_, handler)) = self.routes.iter().find(|(p, _)| p == path) {
            return handler.respond();
        }

        match (path, &self.registry) {
            ("/metrics", Some(registry)) => metrics_response(registry),
            _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
        }
    }

    /// Serve connections from `listener` until `shutdown` is cancelled.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        loop {
            let (stream, remote_addr) = tokio::select! {
                result = listener.accept() => result?,
                _ = shutdown.cancelled() => {
                    debug!("Probe server received shutdown signal");
                    return Ok(());
                }
            };
            let _ = stream.set_nodelay(true);
            let router = Arc::clone(&self);

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = Arc::clone(&router);
                    async move { Ok::<_, Infallible>(router.handle(&req)) }
                });

                let io = TokioIo::new(stream);
                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Probe connection from {} closed: {}", remote_addr, e);
                }
            });
        }
    }
}

impl std::fmt::Debug for ProbeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRouter")
            .field("routes", &self.routes)
            .field("metrics", &self.registry.is_some())
            .finish()
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn metrics_response(registry: &Registry) -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }

    let mut response = Response::new(Full::new(Bytes::from(buffer)));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}
