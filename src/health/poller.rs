//! One poll cycle: concurrent fan-out, merge, publish.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use futures_util::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    CheckError, HealthCheckTarget, HealthzError, MetricSink, Outcome, ProbeGroup, Snapshot,
};

/// Shared state of the poll loop.
///
/// Cloned into the background task; every clone publishes into the same
/// snapshot cell.
#[derive(Clone)]
pub(crate) struct Poller {
    targets: Arc<[HealthCheckTarget]>,
    metric: Option<Arc<dyn MetricSink>>,
    data: Arc<ArcSwap<Snapshot>>,
}

impl Poller {
    pub(crate) fn new(targets: Vec<HealthCheckTarget>) -> Self {
        Self {
            targets: targets.into(),
            metric: None,
            data: Arc::new(ArcSwap::from_pointee(Snapshot::unchecked())),
        }
    }

    pub(crate) fn targets(&self) -> &[HealthCheckTarget] {
        &self.targets
    }

    pub(crate) fn set_targets(&mut self, targets: Vec<HealthCheckTarget>) {
        self.targets = targets.into();
    }

    pub(crate) fn set_metric(&mut self, metric: Option<Arc<dyn MetricSink>>) {
        self.metric = metric;
    }

    /// Latest published snapshot. Lock-free.
    pub(crate) fn snapshot(&self) -> Arc<Snapshot> {
        self.data.load_full()
    }

    pub(crate) fn health(
        &self,
        group: ProbeGroup,
        need_all_healthy: bool,
    ) -> Result<(), HealthzError> {
        self.data.load().health(group, need_all_healthy)
    }

    /// Run every check concurrently and publish the merged snapshot.
    ///
    /// Individual failures never abort the cycle. If `ctx` is cancelled
    /// before all checks return, the outstanding ones are aborted, merged as
    /// [`HealthzError::Cancelled`] and the snapshot is published anyway.
    pub(crate) async fn poll(&self, ctx: &CancellationToken) {
        let start = Instant::now();
        let mut tasks = JoinSet::new();

        for (index, target) in self.targets.iter().enumerate() {
            let service = Arc::clone(&target.service);
            let ctx = ctx.clone();

            tasks.spawn(async move {
                let result: Result<(), CheckError> = AssertUnwindSafe(service.health(&ctx))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err("health check panicked".into()));
                (index, Outcome::from(result))
            });
        }

        let mut snapshot = Snapshot::building(self.targets.len());
        let mut results: Vec<Option<bool>> = vec![None; self.targets.len()];
        let mut cancelled = false;

        loop {
            let joined = tokio::select! {
                biased;
                joined = tasks.join_next() => joined,
                _ = ctx.cancelled() => {
                    cancelled = true;
                    break;
                }
            };

            let Some(joined) = joined else { break };

            match joined {
                Ok((index, outcome)) => {
                    let target = &self.targets[index];
                    if let Some(failure) = outcome.failure() {
                        warn!(
                            "Health check failed: scope={} dest={}: {}",
                            target.service.scope(),
                            target.service.dest(),
                            failure
                        );
                    }
                    snapshot.add(target.groups, &outcome);
                    results[index] = Some(outcome.is_healthy());
                }
                // Only reachable through abort; panics are caught above.
                Err(e) => warn!("Health check task failed: {}", e),
            }
        }

        if cancelled {
            tasks.abort_all();
            let outcome = Outcome::Unhealthy(Arc::new(HealthzError::Cancelled));
            for (index, target) in self.targets.iter().enumerate() {
                if results[index].is_none() {
                    snapshot.add(target.groups, &outcome);
                    results[index] = Some(false);
                }
            }
            debug!("Poll cycle cancelled, publishing partial results");
        }

        self.record_metrics(&results);

        let healthy = results.iter().filter(|r| **r == Some(true)).count();
        self.data.store(Arc::new(snapshot.finish()));

        debug!(
            "Poll cycle complete: {}/{} healthy in {:?}",
            healthy,
            self.targets.len(),
            start.elapsed()
        );
    }

    fn record_metrics(&self, results: &[Option<bool>]) {
        let Some(metric) = &self.metric else {
            return;
        };

        for (target, healthy) in self.targets.iter().zip(results) {
            let Some(healthy) = healthy else { continue };
            let value = if *healthy { 1.0 } else { 0.0 };
            metric.record(target.service.scope(), target.service.dest(), value);
        }
    }
}
