//! Test double for [`HealthCheckable`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{CheckError, HealthCheckable};

enum Behavior {
    Healthy,
    Failing(&'static str),
    Panicking,
}

pub(crate) struct MockService {
    scope: &'static str,
    dest: &'static str,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockService {
    fn new(scope: &'static str, dest: &'static str, behavior: Behavior) -> Self {
        Self {
            scope,
            dest,
            behavior,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn healthy(scope: &'static str, dest: &'static str) -> Self {
        Self::new(scope, dest, Behavior::Healthy)
    }

    pub(crate) fn failing(scope: &'static str, dest: &'static str, msg: &'static str) -> Self {
        Self::new(scope, dest, Behavior::Failing(msg))
    }

    pub(crate) fn panicking(scope: &'static str, dest: &'static str) -> Self {
        Self::new(scope, dest, Behavior::Panicking)
    }

    /// Sleep before answering. Ignores cancellation.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl HealthCheckable for MockService {
    async fn health(&self, _cancel: &CancellationToken) -> Result<(), CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.behavior {
            Behavior::Healthy => Ok(()),
            Behavior::Failing(msg) => Err(msg.into()),
            Behavior::Panicking => panic!("mock check panicked"),
        }
    }

    fn scope(&self) -> &str {
        self.scope
    }

    fn dest(&self) -> &str {
        self.dest
    }
}
