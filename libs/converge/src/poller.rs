//! Convergence poller.
//!
//! Re-fetches a resource until its extracted status lands in a terminal
//! bucket of a [`WaitSpec`] or the deadline passes. Polls are spaced by an
//! exponential backoff that never drops below the wait's minimum interval.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::{FetchError, WaitError};
use crate::spec::WaitSpec;
use crate::status::ConvergenceStatus;

/// Reads the current state of a remote resource.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Identifier used to address the resource.
    type Id: fmt::Display + Send + Sync + ?Sized;

    /// Whatever the remote API returns for the resource.
    type Snapshot: Send;

    /// Fetch the current snapshot. Absence is reported as [`FetchError::NotFound`].
    async fn fetch(&self, id: &Self::Id) -> Result<Self::Snapshot, FetchError>;
}

/// Outcome of a successful wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence<T> {
    /// The resource reached a target status.
    Present(T),
    /// The resource is gone and the wait accepted absence.
    Absent,
}

impl<T> Presence<T> {
    pub fn into_present(self) -> Option<T> {
        match self {
            Self::Present(snapshot) => Some(snapshot),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Spacing between polls: doubles from the initial backoff up to the cap,
/// floored at the wait's minimum poll interval.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    next: Duration,
    max: Duration,
    floor: Duration,
}

impl Backoff {
    pub(crate) fn new(spec: &WaitSpec) -> Self {
        Self {
            next: spec.initial_backoff(),
            max: spec.max_backoff(),
            floor: spec.min_poll_interval(),
        }
    }

    pub(crate) fn next_interval(&mut self) -> Duration {
        let current = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        current.max(self.floor)
    }
}

/// Polls a resource through a [`Fetcher`] until it converges.
#[derive(Debug, Clone)]
pub struct ConvergencePoller<F> {
    fetcher: F,
}

impl<F: Fetcher> ConvergencePoller<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Wait until `extract(snapshot)` is a target status.
    ///
    /// Returns [`Presence::Absent`] only when the wait targets absence. An
    /// error status, a fetch failure, or a missing resource under any other
    /// spec ends the wait immediately. Statuses outside every bucket are
    /// logged and polling continues. The wait gives up as soon as the next
    /// poll could not start before the deadline.
    pub async fn await_state<E>(
        &self,
        id: &F::Id,
        extract: E,
        spec: &WaitSpec,
    ) -> Result<Presence<F::Snapshot>, WaitError<F::Snapshot>>
    where
        E: Fn(&F::Snapshot) -> String + Send + Sync,
    {
        let started = Instant::now();
        let mut backoff = Backoff::new(spec);
        let mut last_status: Option<String> = None;
        let mut last_snapshot: Option<F::Snapshot> = None;
        let mut attempt: u32 = 0;

        debug!(
            resource = %id,
            target = %spec.target(),
            timeout_secs = spec.timeout().as_secs(),
            "Waiting for resource to converge"
        );

        if !spec.delay().is_zero() {
            sleep(spec.delay()).await;
        }

        loop {
            attempt += 1;

            match self.fetcher.fetch(id).await {
                Ok(snapshot) => {
                    let status = extract(&snapshot);
                    match spec.classify(&status) {
                        ConvergenceStatus::Converged => {
                            info!(resource = %id, %status, attempt, "Resource converged");
                            return Ok(Presence::Present(snapshot));
                        }
                        ConvergenceStatus::Diverged => {
                            warn!(
                                resource = %id,
                                %status,
                                attempt,
                                "Resource entered error status"
                            );
                            return Err(WaitError::ErrorStatus {
                                id: id.to_string(),
                                status,
                                snapshot,
                            });
                        }
                        ConvergenceStatus::Converging => {
                            debug!(resource = %id, %status, attempt, "Resource still converging");
                        }
                        ConvergenceStatus::Unknown => {
                            debug!(
                                resource = %id,
                                %status,
                                attempt,
                                "Unrecognized status, continuing to poll"
                            );
                        }
                    }
                    last_status = Some(status);
                    last_snapshot = Some(snapshot);
                }
                Err(FetchError::NotFound) if spec.expects_absence() => {
                    info!(resource = %id, attempt, "Resource no longer exists");
                    return Ok(Presence::Absent);
                }
                Err(source) => {
                    warn!(resource = %id, attempt, error = %source, "Fetch failed during wait");
                    return Err(WaitError::Fetch {
                        id: id.to_string(),
                        source,
                    });
                }
            }

            let elapsed = started.elapsed();
            let interval = backoff.next_interval();
            if elapsed.saturating_add(interval) > spec.timeout() {
                warn!(
                    resource = %id,
                    attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Timed out waiting for resource"
                );
                return Err(WaitError::Timeout {
                    id: id.to_string(),
                    target: spec.target().to_string(),
                    last_status,
                    last_snapshot,
                    elapsed,
                    timeout: spec.timeout(),
                });
            }
            sleep(interval).await;
        }
    }
}
