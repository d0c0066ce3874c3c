//! HTTP boundary: probe handlers and the internal probe server.
//!
//! ```rust,ignore
//! use healthz::server::{ProbeRouter, ResponseFormatter};
//!
//! let router = Arc::new(ProbeRouter::standard(&inspector, None).with_registry(registry));
//! let listener = TcpListener::bind("0.0.0.0:6060").await?;
//! router.serve(listener, shutdown.clone()).await?;
//! ```

mod handler;
mod internal;

pub use handler::{
    default_response, json_response, HealthHandler, ProbeReport, ResponseFormatter,
    StatusConvention,
};
pub use internal::ProbeRouter;
