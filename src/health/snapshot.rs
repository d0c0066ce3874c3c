//! Point-in-time health results and group queries.

use std::sync::Arc;
use std::time::SystemTime;

use super::{CheckError, Failure, HealthzError, ProbeGroup};

/// Result of a single dependency check.
#[derive(Debug, Clone)]
pub enum Outcome {
    Healthy,
    Unhealthy(Failure),
}

impl Outcome {
    /// The "not yet checked" placeholder.
    pub fn not_yet_checked() -> Self {
        Outcome::Unhealthy(Arc::new(HealthzError::NotYetChecked))
    }

    #[inline]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Outcome::Healthy)
    }

    #[inline]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Healthy => None,
            Outcome::Unhealthy(failure) => Some(failure),
        }
    }
}

impl From<Result<(), CheckError>> for Outcome {
    fn from(result: Result<(), CheckError>) -> Self {
        match result {
            Ok(()) => Outcome::Healthy,
            Err(e) => Outcome::Unhealthy(Failure::from(e)),
        }
    }
}

/// Outcomes of the most recent poll cycle, one list per verdict bucket.
///
/// Never mutated after publication. The common group has no bucket of its
/// own; it only keeps a dependency in the poll rotation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    startup: Vec<Outcome>,
    live: Vec<Outcome>,
    ready: Vec<Outcome>,
    checked_at: Option<SystemTime>,
}

impl Snapshot {
    /// Snapshot published before the first poll: every bucket holds the
    /// "not yet checked" sentinel.
    pub fn unchecked() -> Self {
        Self {
            startup: vec![Outcome::not_yet_checked()],
            live: vec![Outcome::not_yet_checked()],
            ready: vec![Outcome::not_yet_checked()],
            checked_at: None,
        }
    }

    /// Empty snapshot a poll cycle merges into.
    pub(crate) fn building(capacity: usize) -> Self {
        Self {
            startup: Vec::with_capacity(capacity),
            live: Vec::with_capacity(capacity),
            ready: Vec::with_capacity(capacity),
            checked_at: None,
        }
    }

    /// Append an outcome to every bucket selected by `groups`.
    pub(crate) fn add(&mut self, groups: ProbeGroup, outcome: &Outcome) {
        if groups.intersects(ProbeGroup::STARTUP) {
            self.startup.push(outcome.clone());
        }

        if groups.intersects(ProbeGroup::LIVE) {
            self.live.push(outcome.clone());
        }

        if groups.intersects(ProbeGroup::READY) {
            self.ready.push(outcome.clone());
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.checked_at = Some(SystemTime::now());
        self
    }

    /// When the cycle that produced this snapshot completed.
    /// `None` for the unchecked snapshot.
    pub fn checked_at(&self) -> Option<SystemTime> {
        self.checked_at
    }

    pub fn startup(&self) -> &[Outcome] {
        &self.startup
    }

    pub fn live(&self) -> &[Outcome] {
        &self.live
    }

    pub fn ready(&self) -> &[Outcome] {
        &self.ready
    }

    /// Bucket answering a query for `group`.
    ///
    /// A combined mask resolves to a single bucket with precedence
    /// live > ready > startup. Masks without any of the three select nothing.
    pub fn bucket(&self, group: ProbeGroup) -> &[Outcome] {
        if group.intersects(ProbeGroup::LIVE) {
            &self.live
        } else if group.intersects(ProbeGroup::READY) {
            &self.ready
        } else if group.intersects(ProbeGroup::STARTUP) {
            &self.startup
        } else {
            &[]
        }
    }

    /// Evaluate a group.
    ///
    /// With `need_all_healthy` every outcome must be healthy; otherwise one
    /// healthy outcome is enough. The error joins the failures of the bucket.
    /// An empty bucket has nothing to object and passes.
    pub fn health(&self, group: ProbeGroup, need_all_healthy: bool) -> Result<(), HealthzError> {
        let bucket = self.bucket(group);

        if !need_all_healthy && bucket.iter().any(Outcome::is_healthy) {
            return Ok(());
        }

        let failures: Vec<Failure> = bucket
            .iter()
            .filter_map(Outcome::failure)
            .cloned()
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(HealthzError::Unhealthy(failures))
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::unchecked()
    }
}
