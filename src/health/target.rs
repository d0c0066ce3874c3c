//! Checked dependencies and their group membership.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{CheckError, ProbeGroup};

/// A dependency the inspector can probe.
///
/// Implementations must be thread-safe: a check runs on its own task each
/// poll cycle. The token is cancelled when the context passed to
/// [`Inspector::start`](super::Inspector::start) is cancelled; long checks
/// should select on it.
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Perform the health check.
    async fn health(&self, cancel: &CancellationToken) -> Result<(), CheckError>;

    /// Coarse category, e.g. "database", "cache", "kafka".
    fn scope(&self) -> &str;

    /// Specific resource, e.g. "redis-primary" or "kafka-1.domain.local:8321".
    fn dest(&self) -> &str;
}

/// A dependency paired with the probe groups it contributes to.
#[derive(Clone)]
pub struct HealthCheckTarget {
    pub service: Arc<dyn HealthCheckable>,
    pub groups: ProbeGroup,
}

impl HealthCheckTarget {
    pub fn new(service: Arc<dyn HealthCheckable>, groups: ProbeGroup) -> Self {
        Self { service, groups }
    }
}

impl fmt::Debug for HealthCheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheckTarget")
            .field("scope", &self.service.scope())
            .field("dest", &self.service.dest())
            .field("groups", &self.groups)
            .finish()
    }
}
