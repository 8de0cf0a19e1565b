//! Convergence primitives for eventually-consistent remote resources.
//!
//! Remote mutations on the cloud API are fire-and-forget: a call returns an
//! acknowledgement and the resource then moves through intermediate states
//! until it settles. This library provides the two pieces every resource
//! operation is built from:
//!
//! - **Convergence poller**: re-fetches a resource and classifies its status
//!   into pending / target / error / not-found until it reaches a terminal
//!   status or the deadline passes.
//! - **Ordered mutation planner**: given a worker pool's current and desired
//!   `{node_count, min, max}`, picks the order of remote calls so the remote
//!   invariant `min <= node_count <= max` holds after every single call.
//!
//! # Invariants
//!
//! - A wait never outlives its timeout by more than one fetch round-trip
//! - Poll spacing never drops below the wait's minimum poll interval
//! - Step N of a plan is never issued before step N-1 has converged
//! - Nothing is persisted; the remote system is the only source of truth

pub mod error;
pub mod executor;
pub mod field;
pub mod planner;
pub mod poller;
pub mod spec;
pub mod status;

pub use error::{AbortCause, BoxError, FetchError, PlanAbort, WaitError};
pub use executor::{PlanExecutor, WorkerPoolMutator};
pub use field::MutableField;
pub use planner::{
    plan_worker_pool, MutationPlan, MutationStep, PlanOrder, StepAction, WindowViolation,
    WorkerPoolChange, WorkerPoolState,
};
pub use poller::{ConvergencePoller, Fetcher, Presence};
pub use spec::{WaitSpec, WaitSpecBuilder, WaitSpecError};
pub use status::{ConvergenceStatus, StatusSet, NOT_FOUND_STATUS};
