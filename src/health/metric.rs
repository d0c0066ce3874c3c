//! Gauge sink for per-dependency health.
//!
//! After each poll cycle the inspector writes `1.0` (healthy) or `0.0`
//! (unhealthy) for every target, addressed by its `scope` and `dest` labels.

use prometheus::core::Collector;
use prometheus::{GaugeVec, Opts};

use super::HealthzError;

/// Label carrying [`HealthCheckable::scope`](super::HealthCheckable::scope).
pub const SCOPE_LABEL: &str = "scope";

/// Label carrying [`HealthCheckable::dest`](super::HealthCheckable::dest).
pub const DEST_LABEL: &str = "dest";

/// Gauge-style collector addressed by exactly `scope` and `dest`.
pub trait MetricSink: Send + Sync {
    /// Variable label names, in order.
    fn label_names(&self) -> Vec<String>;

    /// Record the health value of one dependency.
    fn record(&self, scope: &str, dest: &str, value: f64);
}

impl MetricSink for GaugeVec {
    fn label_names(&self) -> Vec<String> {
        Collector::desc(self)
            .first()
            .map(|desc| desc.variable_labels.clone())
            .unwrap_or_default()
    }

    fn record(&self, scope: &str, dest: &str, value: f64) {
        self.with_label_values(&[scope, dest]).set(value);
    }
}

/// Check that the sink exposes `scope,dest` and nothing else.
pub(crate) fn validate_labels(sink: &dyn MetricSink) -> Result<(), HealthzError> {
    let labels = sink.label_names();

    if labels.len() == 2 && labels[0] == SCOPE_LABEL && labels[1] == DEST_LABEL {
        return Ok(());
    }

    Err(HealthzError::InvalidMetricShape { labels })
}

/// Build a gauge vector with the labels the inspector expects.
pub fn health_gauge(opts: Opts) -> Result<GaugeVec, prometheus::Error> {
    GaugeVec::new(opts, &[SCOPE_LABEL, DEST_LABEL])
}
