//! Wait specifications: status buckets, deadline and poll spacing.

use std::time::Duration;

use thiserror::Error;

use crate::status::{ConvergenceStatus, StatusSet, NOT_FOUND_STATUS};

/// First backoff interval after a non-terminal observation.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Backoff never grows past this.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Invalid wait configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WaitSpecError {
    #[error("wait timeout must be greater than zero")]
    ZeroTimeout,

    #[error("wait declares no target status")]
    NoTargetStatus,

    #[error("statuses declared as both target and error: {0:?}")]
    OverlappingStatuses(Vec<String>),

    #[error("initial delay {delay:?} exceeds timeout {timeout:?}")]
    DelayExceedsTimeout { delay: Duration, timeout: Duration },

    #[error("poll spacing must be greater than zero")]
    ZeroPollSpacing,
}

/// What to wait for and how long.
///
/// Built through [`WaitSpec::builder`] or [`WaitSpec::deletion`], which reject
/// configurations that could never terminate or could hot-loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    pending: StatusSet,
    target: StatusSet,
    error: StatusSet,
    timeout: Duration,
    delay: Duration,
    min_poll_interval: Duration,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl WaitSpec {
    /// Start a wait that gives up after `timeout`.
    pub fn builder(timeout: Duration) -> WaitSpecBuilder {
        WaitSpecBuilder::new(timeout)
    }

    /// Start a wait that succeeds once the resource no longer exists.
    pub fn deletion(timeout: Duration) -> WaitSpecBuilder {
        WaitSpecBuilder::new(timeout).target([NOT_FOUND_STATUS])
    }

    pub fn pending(&self) -> &StatusSet {
        &self.pending
    }

    pub fn target(&self) -> &StatusSet {
        &self.target
    }

    pub fn error(&self) -> &StatusSet {
        &self.error
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn min_poll_interval(&self) -> Duration {
        self.min_poll_interval
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Returns true if absence of the resource counts as success.
    pub fn expects_absence(&self) -> bool {
        self.target.contains(NOT_FOUND_STATUS)
    }

    /// Classify an observed status. Target membership is checked first.
    pub fn classify(&self, status: &str) -> ConvergenceStatus {
        if self.target.contains(status) {
            ConvergenceStatus::Converged
        } else if self.error.contains(status) {
            ConvergenceStatus::Diverged
        } else if self.pending.contains(status) {
            ConvergenceStatus::Converging
        } else {
            ConvergenceStatus::Unknown
        }
    }

    /// Same buckets, different deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self, WaitSpecError> {
        let mut spec = self.clone();
        spec.timeout = timeout;
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), WaitSpecError> {
        if self.timeout.is_zero() {
            return Err(WaitSpecError::ZeroTimeout);
        }
        if self.target.is_empty() {
            return Err(WaitSpecError::NoTargetStatus);
        }
        let overlap = self.target.overlap(&self.error);
        if !overlap.is_empty() {
            return Err(WaitSpecError::OverlappingStatuses(overlap));
        }
        if self.delay > self.timeout {
            return Err(WaitSpecError::DelayExceedsTimeout {
                delay: self.delay,
                timeout: self.timeout,
            });
        }
        if self.min_poll_interval.is_zero() && self.initial_backoff.is_zero() {
            return Err(WaitSpecError::ZeroPollSpacing);
        }
        Ok(())
    }
}

/// Builder for [`WaitSpec`].
#[derive(Debug, Clone)]
pub struct WaitSpecBuilder {
    spec: WaitSpec,
}

impl WaitSpecBuilder {
    fn new(timeout: Duration) -> Self {
        Self {
            spec: WaitSpec {
                pending: StatusSet::new(),
                target: StatusSet::new(),
                error: StatusSet::new(),
                timeout,
                delay: Duration::ZERO,
                min_poll_interval: Duration::ZERO,
                initial_backoff: DEFAULT_INITIAL_BACKOFF,
                max_backoff: DEFAULT_MAX_BACKOFF,
            },
        }
    }

    /// Statuses that mean "still working on it".
    pub fn pending<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.pending = statuses.into_iter().collect();
        self
    }

    /// Statuses that end the wait successfully.
    pub fn target<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.target = statuses.into_iter().collect();
        self
    }

    /// Statuses that end the wait with a failure.
    pub fn error<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.error = statuses.into_iter().collect();
        self
    }

    /// Sleep before the first poll.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.spec.delay = delay;
        self
    }

    /// Floor on the spacing between consecutive polls.
    pub fn min_poll_interval(mut self, interval: Duration) -> Self {
        self.spec.min_poll_interval = interval;
        self
    }

    /// Exponential backoff bounds between polls.
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.spec.initial_backoff = initial;
        self.spec.max_backoff = max.max(initial);
        self
    }

    pub fn build(self) -> Result<WaitSpec, WaitSpecError> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}
