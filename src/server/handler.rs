//! Probe request handler.

use std::convert::Infallible;
use std::fmt;
use std::future::{ready, Ready};
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;

use crate::health::{HealthzError, Inspector, ProbeGroup};

/// Which status code means "healthy".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusConvention {
    /// 200 when healthy, 503 when unhealthy.
    #[default]
    Standard,
    /// 503 when healthy, 200 when unhealthy. Kept for deployments whose
    /// probe configuration was written against this mapping.
    Inverted,
}

impl StatusConvention {
    pub fn status(self, healthy: bool) -> StatusCode {
        match (self, healthy) {
            (Self::Standard, true) | (Self::Inverted, false) => StatusCode::OK,
            (Self::Standard, false) | (Self::Inverted, true) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

type RenderFn = dyn Fn(Option<&HealthzError>) -> Bytes + Send + Sync;

/// Turns a query result into a response body.
#[derive(Clone)]
pub struct ResponseFormatter {
    content_type: &'static str,
    render: Arc<RenderFn>,
}

impl ResponseFormatter {
    pub fn new<F>(content_type: &'static str, render: F) -> Self
    where
        F: Fn(Option<&HealthzError>) -> Bytes + Send + Sync + 'static,
    {
        Self {
            content_type,
            render: Arc::new(render),
        }
    }

    /// Plain `OK` / `Unhealthy`.
    pub fn text() -> Self {
        Self::new("text/plain; charset=utf-8", default_response)
    }

    /// `{"status":"ok"}` or `{"status":"unhealthy","errors":[...]}`.
    pub fn json() -> Self {
        Self::new("application/json", json_response)
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn render(&self, err: Option<&HealthzError>) -> Bytes {
        (self.render)(err)
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::text()
    }
}

impl fmt::Debug for ResponseFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFormatter")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Default body: `OK` when healthy, `Unhealthy` otherwise.
pub fn default_response(err: Option<&HealthzError>) -> Bytes {
    match err {
        None => Bytes::from_static(b"OK"),
        Some(_) => Bytes::from_static(b"Unhealthy"),
    }
}

/// JSON body of a probe response.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// "ok" or "unhealthy"
    pub status: &'static str,
    /// One entry per failed outcome
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ProbeReport {
    pub fn from_error(err: Option<&HealthzError>) -> Self {
        match err {
            None => Self {
                status: "ok",
                errors: Vec::new(),
            },
            Some(HealthzError::Unhealthy(failures)) => Self {
                status: "unhealthy",
                errors: failures.iter().map(|f| f.to_string()).collect(),
            },
            Some(other) => Self {
                status: "unhealthy",
                errors: vec![other.to_string()],
            },
        }
    }
}

/// JSON body listing every failure reason.
pub fn json_response(err: Option<&HealthzError>) -> Bytes {
    let report = ProbeReport::from_error(err);
    serde_json::to_vec(&report)
        .map(Bytes::from)
        .unwrap_or_else(|_| Bytes::from_static(b"{}"))
}

/// Answers a single probe group.
///
/// Reads the latest snapshot on every request; never waits for a poll.
/// Request method, path and body are ignored.
#[derive(Clone)]
pub struct HealthHandler {
    inspector: Arc<Inspector>,
    group: ProbeGroup,
    need_all_healthy: bool,
    formatter: ResponseFormatter,
    convention: StatusConvention,
}

impl HealthHandler {
    pub fn new(
        inspector: Arc<Inspector>,
        group: ProbeGroup,
        need_all_healthy: bool,
        formatter: Option<ResponseFormatter>,
    ) -> Self {
        Self {
            inspector,
            group,
            need_all_healthy,
            formatter: formatter.unwrap_or_default(),
            convention: StatusConvention::default(),
        }
    }

    pub fn with_status_convention(mut self, convention: StatusConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn group(&self) -> ProbeGroup {
        self.group
    }

    /// Build the response for the current snapshot.
    pub fn respond(&self) -> Response<Full<Bytes>> {
        let result = self.inspector.check_group(self.group, self.need_all_healthy);
        let err = result.as_ref().err();

        let mut response = Response::new(Full::new(self.formatter.render(err)));
        *response.status_mut() = self.convention.status(err.is_none());
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static(self.formatter.content_type()),
        );
        response
    }
}

impl fmt::Debug for HealthHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthHandler")
            .field("group", &self.group)
            .field("need_all_healthy", &self.need_all_healthy)
            .field("convention", &self.convention)
            .finish()
    }
}

impl<B> Service<Request<B>> for HealthHandler {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn call(&self, _req: Request<B>) -> Self::Future {
        ready(Ok(self.respond()))
    }
}

impl Inspector {
    /// Handler factory for one probe group.
    pub fn health_handler(
        self: &Arc<Self>,
        group: ProbeGroup,
        need_all_healthy: bool,
        formatter: Option<ResponseFormatter>,
    ) -> HealthHandler {
        HealthHandler::new(Arc::clone(self), group, need_all_healthy, formatter)
    }
}
