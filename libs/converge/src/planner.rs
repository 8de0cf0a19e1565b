//! Ordered mutation planning for worker pools.
//!
//! The remote API enforces `min <= node_count <= max` on every call, so a
//! change that touches both the bounds and the count has to be split into
//! calls whose intermediate states all satisfy that window.

use std::fmt;

use thiserror::Error;

use crate::field::MutableField;
use crate::spec::WaitSpec;

/// Node count and autoscaling bounds of a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerPoolState {
    pub node_count: u32,
    pub min_node_count: u32,
    pub max_node_count: u32,
}

impl WorkerPoolState {
    pub fn new(node_count: u32, min_node_count: u32, max_node_count: u32) -> Self {
        Self {
            node_count,
            min_node_count,
            max_node_count,
        }
    }

    /// Returns true if `count` lies inside this state's window.
    pub fn admits(&self, count: u32) -> bool {
        self.min_node_count <= count && count <= self.max_node_count
    }

    /// Returns true if the node count lies inside the bounds.
    pub fn is_consistent(&self) -> bool {
        self.admits(self.node_count)
    }
}

impl fmt::Display for WorkerPoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes in [{}, {}]",
            self.node_count, self.min_node_count, self.max_node_count
        )
    }
}

/// Per-field change set for a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolChange {
    pub node_count: MutableField<u32>,
    pub min_node_count: MutableField<u32>,
    pub max_node_count: MutableField<u32>,
}

impl WorkerPoolChange {
    /// Diff two states field by field.
    pub fn between(current: WorkerPoolState, desired: WorkerPoolState) -> Self {
        Self {
            node_count: MutableField::diff(current.node_count, desired.node_count),
            min_node_count: MutableField::diff(current.min_node_count, desired.min_node_count),
            max_node_count: MutableField::diff(current.max_node_count, desired.max_node_count),
        }
    }

    pub fn current(&self) -> WorkerPoolState {
        WorkerPoolState::new(
            self.node_count.current(),
            self.min_node_count.current(),
            self.max_node_count.current(),
        )
    }

    pub fn desired(&self) -> WorkerPoolState {
        WorkerPoolState::new(
            self.node_count.desired(),
            self.min_node_count.desired(),
            self.max_node_count.desired(),
        )
    }

    pub fn bounds_changed(&self) -> bool {
        self.min_node_count.is_changed() || self.max_node_count.is_changed()
    }

    pub fn count_changed(&self) -> bool {
        self.node_count.is_changed()
    }

    pub fn is_empty(&self) -> bool {
        !self.bounds_changed() && !self.count_changed()
    }
}

/// One remote mutation on a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Change min and max together.
    SetBounds { min: u32, max: u32 },
    /// Change the node count alone.
    Resize { node_count: u32 },
}

impl StepAction {
    /// State the remote would hold after accepting this call.
    pub fn apply(&self, state: WorkerPoolState) -> WorkerPoolState {
        match *self {
            Self::SetBounds { min, max } => WorkerPoolState {
                min_node_count: min,
                max_node_count: max,
                ..state
            },
            Self::Resize { node_count } => WorkerPoolState { node_count, ..state },
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetBounds { min, max } => write!(f, "set bounds to [{min}, {max}]"),
            Self::Resize { node_count } => write!(f, "resize to {node_count} nodes"),
        }
    }
}

/// One remote call plus the wait that confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationStep {
    action: StepAction,
    wait: WaitSpec,
}

impl MutationStep {
    pub fn new(action: StepAction, wait: WaitSpec) -> Self {
        Self { action, wait }
    }

    pub fn action(&self) -> StepAction {
        self.action
    }

    pub fn wait(&self) -> &WaitSpec {
        &self.wait
    }
}

/// How the planner ordered a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOrder {
    /// Nothing to do.
    Empty,
    /// Only the node count changed.
    ResizeOnly,
    /// Only the bounds changed.
    BoundsOnly,
    /// Current count already fits the new window.
    BoundsFirst,
    /// Count moves first, then the window follows it.
    ResizeFirst,
    /// Neither order is accepted; widen to the union of both windows,
    /// resize, then narrow.
    Widened,
}

impl fmt::Display for PlanOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::ResizeOnly => "resize-only",
            Self::BoundsOnly => "bounds-only",
            Self::BoundsFirst => "bounds-first",
            Self::ResizeFirst => "resize-first",
            Self::Widened => "widen-resize-narrow",
        };
        write!(f, "{name}")
    }
}

/// A step would leave the pool outside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("step {step} ({action}) would leave {state}")]
pub struct WindowViolation {
    pub step: usize,
    pub action: StepAction,
    pub state: WorkerPoolState,
}

/// Ordered remote calls for one worker pool change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPlan {
    order: PlanOrder,
    steps: Vec<MutationStep>,
}

impl MutationPlan {
    pub fn order(&self) -> PlanOrder {
        self.order
    }

    pub fn steps(&self) -> &[MutationStep] {
        &self.steps
    }

    pub fn actions(&self) -> Vec<StepAction> {
        self.steps.iter().map(MutationStep::action).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Replay the plan from `start`, checking the window after every call.
    pub fn simulate(&self, start: WorkerPoolState) -> Result<WorkerPoolState, WindowViolation> {
        self.steps
            .iter()
            .enumerate()
            .try_fold(start, |state, (index, step)| {
                let next = step.action.apply(state);
                if next.is_consistent() {
                    Ok(next)
                } else {
                    Err(WindowViolation {
                        step: index + 1,
                        action: step.action,
                        state: next,
                    })
                }
            })
    }
}

/// Order the remote calls for a worker pool change.
///
/// Bounds are always set from the desired min and max together. When both
/// the bounds and the count change, the current count is tested against the
/// desired window: inside means bounds first, outside means resize first.
/// If resizing first would also leave the old window and the desired state
/// is itself valid, the window is widened to cover both before resizing.
/// That widened plan is the only one with more than two steps.
pub fn plan_worker_pool(change: &WorkerPoolChange, wait: &WaitSpec) -> MutationPlan {
    let current = change.current();
    let desired = change.desired();
    let set_desired_bounds = StepAction::SetBounds {
        min: desired.min_node_count,
        max: desired.max_node_count,
    };
    let resize = StepAction::Resize {
        node_count: desired.node_count,
    };

    let (order, actions) = match (change.bounds_changed(), change.count_changed()) {
        (false, false) => (PlanOrder::Empty, vec![]),
        (false, true) => (PlanOrder::ResizeOnly, vec![resize]),
        (true, false) => (PlanOrder::BoundsOnly, vec![set_desired_bounds]),
        (true, true) if desired.admits(current.node_count) => {
            (PlanOrder::BoundsFirst, vec![set_desired_bounds, resize])
        }
        (true, true) if current.admits(desired.node_count) || !desired.is_consistent() => {
            (PlanOrder::ResizeFirst, vec![resize, set_desired_bounds])
        }
        (true, true) => {
            let hull = StepAction::SetBounds {
                min: current.min_node_count.min(desired.min_node_count),
                max: current.max_node_count.max(desired.max_node_count),
            };
            (PlanOrder::Widened, vec![hull, resize, set_desired_bounds])
        }
    };

    MutationPlan {
        order,
        steps: actions
            .into_iter()
            .map(|action| MutationStep::new(action, wait.clone()))
            .collect(),
    }
}
