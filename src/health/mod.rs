//! Dependency health aggregation for Kubernetes probes.
//!
//! An [`Inspector`] periodically polls registered dependencies and sorts the
//! outcomes into probe group buckets:
//! - **Startup**: Has initialization completed? (wait before other probes)
//! - **Liveness**: Is the process alive? (restart container if failed)
//! - **Readiness**: Can the service handle traffic? (remove from LB if failed)
//! - **Common**: polled and reported to metrics, never gates a probe
//!
//! Each poll cycle builds a fresh [`Snapshot`] and swaps it in atomically;
//! probe handlers read the latest one without locking.
//!
//! # Kubernetes Integration
//!
//! ```yaml
//! startupProbe:
//!   httpGet:
//!     path: /healthz/startup
//!     port: 6060
//!   failureThreshold: 30
//!   periodSeconds: 2
//!
//! livenessProbe:
//!   httpGet:
//!     path: /healthz/live
//!     port: 6060
//!   periodSeconds: 10
//!
//! readinessProbe:
//!   httpGet:
//!     path: /healthz/ready
//!     port: 6060
//!   periodSeconds: 5
//! ```

mod error;
mod group;
mod inspector;
mod metric;
mod poller;
mod snapshot;
mod target;

#[cfg(test)]
mod mock;

pub use error::{CheckError, Failure, HealthzError};
pub use group::ProbeGroup;
pub use inspector::{Inspector, LifecycleState, DEFAULT_CHECK_PERIOD, SHUTDOWN_TIMEOUT};
pub use metric::{health_gauge, MetricSink, DEST_LABEL, SCOPE_LABEL};
pub use snapshot::{Outcome, Snapshot};
pub use target::{HealthCheckTarget, HealthCheckable};
