//! healthz - dependency health aggregation for Kubernetes probes.
//!
//! Register the dependencies a service talks to, tag each with the probe
//! groups it gates, and let an [`Inspector`] poll them in the background.
//! Probe endpoints answer from the latest snapshot without waiting on a
//! dependency, and every outcome is mirrored to a Prometheus gauge.
//!
//! # Features
//!
//! - **Probe groups**: startup, liveness, readiness and common buckets
//! - **Concurrent polling**: one task per dependency per cycle, panics contained
//! - **Lock-free reads**: each cycle publishes a fresh immutable snapshot
//! - **Metrics**: `{scope, dest}` gauge per dependency, 1 healthy / 0 not
//! - **HTTP**: hyper handlers for `/healthz/*` and `/metrics`
//!
//! # Example
//!
//! ```rust,ignore
//! use healthz::{HealthCheckTarget, Inspector, ProbeGroup};
//! use healthz::server::ProbeRouter;
//!
//! let inspector = Arc::new(
//!     Inspector::new(vec![HealthCheckTarget::new(db, ProbeGroup::READY)])
//!         .with_check_period(Duration::from_secs(5))?,
//! );
//! inspector.start(shutdown.child_token());
//!
//! let router = Arc::new(ProbeRouter::standard(&inspector, None));
//! router.serve(TcpListener::bind("0.0.0.0:6060").await?, shutdown.clone()).await?;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars) when built from a checkout, empty otherwise
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

pub mod config;
pub mod health;
pub mod logging;
pub mod server;

// Re-exports for convenience
pub use config::Config;
pub use health::{
    CheckError, HealthCheckTarget, HealthCheckable, HealthzError, Inspector, LifecycleState,
    MetricSink, ProbeGroup, Snapshot,
};
