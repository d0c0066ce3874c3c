//! Error types for the health inspector.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A dependency check failure, shared between every bucket it lands in.
pub type Failure = Arc<dyn std::error::Error + Send + Sync>;

/// Error returned by a [`HealthCheckable`](super::HealthCheckable) implementation.
pub type CheckError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the inspector.
#[derive(Debug, Clone)]
pub enum HealthzError {
    /// Probe group mask is zero.
    EmptyGroup,
    /// Probe group mask has bits outside the known groups.
    InvalidGroup(u8),
    /// Replace-all configuration was given no targets.
    MissingTargets,
    /// Poll period is not strictly positive.
    InvalidPeriod(Duration),
    /// Metric sink does not expose exactly the `scope` and `dest` labels.
    InvalidMetricShape {
        /// Labels the sink actually exposes.
        labels: Vec<String>,
    },
    /// Placeholder outcome before the first poll cycle.
    NotYetChecked,
    /// The check was still running when the poll context was cancelled.
    Cancelled,
    /// The background task did not confirm termination in time.
    ShutdownTimeout(Duration),
    /// Aggregated failures of a probe group query.
    Unhealthy(Vec<Failure>),
}

impl HealthzError {
    /// Returns true for errors raised while configuring an inspector.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            HealthzError::EmptyGroup
                | HealthzError::InvalidGroup(_)
                | HealthzError::MissingTargets
                | HealthzError::InvalidPeriod(_)
                | HealthzError::InvalidMetricShape { .. }
        )
    }

    /// Returns true if this is a shutdown timeout.
    pub fn is_shutdown_timeout(&self) -> bool {
        matches!(self, HealthzError::ShutdownTimeout(_))
    }

    /// Failures joined into this error, empty for non-aggregate errors.
    pub fn failures(&self) -> &[Failure] {
        match self {
            HealthzError::Unhealthy(failures) => failures,
            _ => &[],
        }
    }
}

impl fmt::Display for HealthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthzError::EmptyGroup => write!(f, "empty probe group"),
            HealthzError::InvalidGroup(mask) => write!(
                f,
                "invalid probe group {:#06b}, allow only combinations of 1, 2, 4, 8",
                mask
            ),
            HealthzError::MissingTargets => write!(f, "missing targets"),
            HealthzError::InvalidPeriod(period) => {
                write!(f, "incorrect check period: {:?}", period)
            }
            HealthzError::InvalidMetricShape { labels } => write!(
                f,
                "unexpected metric labels [{}], need scope,dest",
                labels.join(",")
            ),
            HealthzError::NotYetChecked => write!(f, "not yet checked"),
            HealthzError::Cancelled => write!(f, "health check cancelled"),
            HealthzError::ShutdownTimeout(waited) => {
                write!(f, "shutdown timeout after {:?}", waited)
            }
            HealthzError::Unhealthy(failures) => {
                // one description per line
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for HealthzError {}
