//! Health inspector: configuration, scheduling and group queries.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::metric::validate_labels;
use super::poller::Poller;
use super::{HealthCheckTarget, HealthzError, MetricSink, ProbeGroup, Snapshot};

/// Poll period used when none is configured.
pub const DEFAULT_CHECK_PERIOD: Duration = Duration::from_secs(15);

/// Upper bound on how long [`Inspector::stop`] waits for the poll loop.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

/// Lifecycle of the background poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never started.
    Idle,
    /// Poll loop is active.
    Running,
    /// Stop requested, loop has not confirmed yet.
    Stopping,
    /// Loop exited (stopped or its context was cancelled).
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Default)]
struct Lifecycle {
    /// Cleared by `stop`, so later calls are no-ops.
    stop: Option<CancellationToken>,
    /// Cancelled by the loop when it exits.
    confirm: Option<CancellationToken>,
}

/// Polls registered dependencies and answers probe group queries.
///
/// Configure with the consuming `with_*` builders, then share behind an
/// `Arc` and [`start`](Inspector::start) it. Once shared the target registry
/// can no longer change, so reconfiguration never races a running poll.
///
/// ```rust,ignore
/// let inspector = Arc::new(
///     Inspector::new(vec![HealthCheckTarget::new(db, ProbeGroup::READY)])
///         .with_check_period(Duration::from_secs(5))?
///         .with_metric(Some(Arc::new(gauge)))?,
/// );
/// inspector.start(shutdown.child_token());
///
/// inspector.check_group(ProbeGroup::READY, true)?;
/// ```
pub struct Inspector {
    poller: Poller,
    check_period: Duration,
    lifecycle: Mutex<Lifecycle>,
}

impl Inspector {
    /// Create an inspector. Targets are not validated here; use
    /// [`with_targets`](Inspector::with_targets) for validated registration.
    pub fn new(targets: Vec<HealthCheckTarget>) -> Self {
        Self {
            poller: Poller::new(targets),
            check_period: DEFAULT_CHECK_PERIOD,
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Replace every target.
    ///
    /// Fails with [`HealthzError::MissingTargets`] for an empty list, or with
    /// the first invalid group mask.
    pub fn with_targets(mut self, targets: Vec<HealthCheckTarget>) -> Result<Self, HealthzError> {
        if targets.is_empty() {
            return Err(HealthzError::MissingTargets);
        }

        for target in &targets {
            target.groups.validate()?;
        }

        self.poller.set_targets(targets);
        Ok(self)
    }

    /// Attach a metric sink, or detach with `None`.
    pub fn with_metric(mut self, metric: Option<Arc<dyn MetricSink>>) -> Result<Self, HealthzError> {
        if let Some(ref sink) = metric {
            validate_labels(sink.as_ref())?;
        }

        self.poller.set_metric(metric);
        Ok(self)
    }

    /// Set the poll period. Must be strictly positive.
    pub fn with_check_period(mut self, period: Duration) -> Result<Self, HealthzError> {
        if period.is_zero() {
            return Err(HealthzError::InvalidPeriod(period));
        }

        self.check_period = period;
        Ok(self)
    }

    pub fn check_period(&self) -> Duration {
        self.check_period
    }

    pub fn targets(&self) -> &[HealthCheckTarget] {
        self.poller.targets()
    }

    /// Evaluate a probe group against the latest snapshot.
    ///
    /// Never blocks on a poll cycle. See [`Snapshot::health`] for the
    /// all/any semantics and group precedence.
    pub fn check_group(&self, group: ProbeGroup, need_all_healthy: bool) -> Result<(), HealthzError> {
        self.poller.health(group, need_all_healthy)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.poller.snapshot()
    }

    /// Run one poll cycle now, outside the schedule.
    pub async fn poll(&self, ctx: &CancellationToken) {
        self.poller.poll(ctx).await;
    }

    /// Spawn the background poll loop.
    ///
    /// Polls immediately, then every `check_period` until [`stop`] is called
    /// or `ctx` is cancelled. Cancelling `ctx` also cancels in-flight checks.
    /// Must be called from within a Tokio runtime. Ignored with a warning if
    /// a loop started earlier is still alive.
    ///
    /// [`stop`]: Inspector::stop
    pub fn start(&self, ctx: CancellationToken) {
        let mut lifecycle = self.lock_lifecycle();

        if let Some(confirm) = &lifecycle.confirm {
            if !confirm.is_cancelled() {
                warn!("Health inspector already running, start ignored");
                return;
            }
        }

        let stop = CancellationToken::new();
        let confirm = CancellationToken::new();
        lifecycle.stop = Some(stop.clone());
        lifecycle.confirm = Some(confirm.clone());
        drop(lifecycle);

        info!(
            "Health inspector started: {} targets, period {:?}",
            self.poller.targets().len(),
            self.check_period
        );

        tokio::spawn(run(
            self.poller.clone(),
            self.check_period,
            ctx,
            stop,
            confirm,
        ));
    }

    /// Stop the background loop and wait for it to confirm.
    ///
    /// Idempotent: returns `Ok` at once if the loop was never started or stop
    /// was already requested. Waits at most `min(deadline, SHUTDOWN_TIMEOUT)`;
    /// on expiry returns [`HealthzError::ShutdownTimeout`] while the loop may
    /// still be finishing a slow check.
    pub async fn stop(&self, deadline: Duration) -> Result<(), HealthzError> {
        let confirm = {
            let mut lifecycle = self.lock_lifecycle();
            let Some(stop) = lifecycle.stop.take() else {
                return Ok(());
            };
            stop.cancel();
            lifecycle.confirm.clone()
        };

        let Some(confirm) = confirm else {
            return Ok(());
        };

        let wait = deadline.min(SHUTDOWN_TIMEOUT);
        match tokio::time::timeout(wait, confirm.cancelled()).await {
            Ok(()) => {
                info!("Health inspector stopped");
                Ok(())
            }
            Err(_) => {
                warn!("Health inspector did not stop within {:?}", wait);
                Err(HealthzError::ShutdownTimeout(wait))
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        let lifecycle = self.lock_lifecycle();
        match (&lifecycle.stop, &lifecycle.confirm) {
            (_, None) => LifecycleState::Idle,
            (_, Some(confirm)) if confirm.is_cancelled() => LifecycleState::Stopped,
            (Some(_), Some(_)) => LifecycleState::Running,
            (None, Some(_)) => LifecycleState::Stopping,
        }
    }

    /// Resolves once the background loop has exited.
    /// Returns immediately if it was never started.
    pub async fn stopped(&self) {
        let confirm = self.lock_lifecycle().confirm.clone();
        if let Some(confirm) = confirm {
            confirm.cancelled().await;
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Inspector {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(stop) = lifecycle.stop.take() {
            stop.cancel();
        }
    }
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("targets", &self.poller.targets())
            .field("check_period", &self.check_period)
            .field("state", &self.state())
            .finish()
    }
}

/// Background poll loop.
async fn run(
    poller: Poller,
    period: Duration,
    ctx: CancellationToken,
    stop: CancellationToken,
    confirm: CancellationToken,
) {
    // fires confirmation however the loop exits
    let _confirm = confirm.drop_guard();

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    poller.poll(&ctx).await;

    loop {
        if ctx.is_cancelled() || stop.is_cancelled() {
            break;
        }

        tokio::select! {
            _ = ctx.cancelled() => break,
            _ = stop.cancelled() => break,
            _ = ticker.tick() => poller.poll(&ctx).await,
        }
    }

    debug!("Health inspector loop exited");
}
