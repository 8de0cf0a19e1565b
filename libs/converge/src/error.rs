//! Error types for convergence waits and mutation plans.

use std::time::Duration;

use thiserror::Error;

use crate::planner::StepAction;

/// Boxed error produced by remote collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by a [`Fetcher`](crate::Fetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote object does not exist.
    #[error("not found")]
    NotFound,

    /// The remote read failed (network, auth, malformed response).
    #[error("{0}")]
    Remote(#[source] BoxError),
}

impl FetchError {
    /// Wrap any remote failure.
    pub fn remote(err: impl Into<BoxError>) -> Self {
        Self::Remote(err.into())
    }

    /// Returns true if the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Terminal failure of a single convergence wait.
///
/// `T` is the snapshot type of the polled resource; error-status and timeout
/// failures carry the last snapshot observed.
#[derive(Debug, Error)]
pub enum WaitError<T> {
    /// The remote read failed, or the resource vanished during a wait that
    /// does not expect absence.
    #[error("failed to fetch {id}: {source}")]
    Fetch {
        id: String,
        #[source]
        source: FetchError,
    },

    /// The resource reached a declared error status.
    #[error("{id} entered error status '{status}'")]
    ErrorStatus {
        id: String,
        status: String,
        snapshot: T,
    },

    /// No terminal status was observed before the deadline.
    ///
    /// `elapsed` can fall short of `timeout` when the next poll would have
    /// landed past the deadline.
    #[error(
        "timed out after {elapsed:?} (limit {timeout:?}) waiting for {id} to reach state {target} (last status: {last})",
        last = .last_status.as_deref().unwrap_or("none")
    )]
    Timeout {
        id: String,
        target: String,
        last_status: Option<String>,
        last_snapshot: Option<T>,
        elapsed: Duration,
        timeout: Duration,
    },
}

impl<T> WaitError<T> {
    /// Identifier of the resource being waited on.
    pub fn id(&self) -> &str {
        match self {
            Self::Fetch { id, .. } | Self::ErrorStatus { id, .. } | Self::Timeout { id, .. } => id,
        }
    }

    /// Last status observed before the failure, if any.
    pub fn last_status(&self) -> Option<&str> {
        match self {
            Self::Fetch { .. } => None,
            Self::ErrorStatus { status, .. } => Some(status),
            Self::Timeout { last_status, .. } => last_status.as_deref(),
        }
    }

    /// Last snapshot observed before the failure, if any.
    pub fn last_snapshot(&self) -> Option<&T> {
        match self {
            Self::Fetch { .. } => None,
            Self::ErrorStatus { snapshot, .. } => Some(snapshot),
            Self::Timeout { last_snapshot, .. } => last_snapshot.as_ref(),
        }
    }

    /// Returns true if the wait ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the resource disappeared mid-wait.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Fetch { source, .. } if source.is_not_found())
    }
}

/// A mutation plan stopped before its last step.
///
/// The remote resource is left in whatever state the last completed step
/// produced; callers re-read it rather than assume a rollback.
#[derive(Debug, Error)]
#[error("step {step} of {total} ({action}) failed after {completed} completed step(s): {cause}")]
pub struct PlanAbort<T> {
    /// 1-based index of the failed step.
    pub step: usize,
    /// Number of steps in the plan.
    pub total: usize,
    /// Steps that fully converged before the failure.
    pub completed: usize,
    /// The action of the failed step.
    pub action: StepAction,
    #[source]
    pub cause: AbortCause<T>,
}

/// Why a plan step failed.
#[derive(Debug, Error)]
pub enum AbortCause<T> {
    /// The remote system refused the mutation call.
    #[error("remote call rejected: {0}")]
    Rejected(#[source] BoxError),

    /// The call was accepted but the resource did not converge.
    #[error("{0}")]
    Wait(#[source] WaitError<T>),
}
