//! Step-by-step execution of a mutation plan.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{AbortCause, BoxError, PlanAbort};
use crate::planner::{MutationPlan, StepAction};
use crate::poller::{ConvergencePoller, Fetcher, Presence};

/// Remote triggers for worker pool mutations.
///
/// Both calls return once the remote has acknowledged the request; completion
/// is only observed through the poller.
#[async_trait]
pub trait WorkerPoolMutator: Send + Sync {
    async fn set_bounds(&self, min: u32, max: u32) -> Result<(), BoxError>;

    async fn resize(&self, node_count: u32) -> Result<(), BoxError>;
}

/// Issues plan steps in order, waiting for each to converge before the next.
pub struct PlanExecutor<'a, F, M> {
    poller: &'a ConvergencePoller<F>,
    mutator: &'a M,
}

impl<'a, F, M> PlanExecutor<'a, F, M>
where
    F: Fetcher,
    M: WorkerPoolMutator,
{
    pub fn new(poller: &'a ConvergencePoller<F>, mutator: &'a M) -> Self {
        Self { poller, mutator }
    }

    /// Run every step of `plan` against the resource `id`.
    ///
    /// Returns the snapshot observed after the last step (`None` for an empty
    /// plan). The first rejected call, error status or timeout aborts the
    /// plan; later steps are never issued.
    pub async fn run<E>(
        &self,
        id: &F::Id,
        plan: &MutationPlan,
        extract: E,
    ) -> Result<Option<F::Snapshot>, PlanAbort<F::Snapshot>>
    where
        E: Fn(&F::Snapshot) -> String + Send + Sync,
    {
        let total = plan.len();
        let mut last = None;

        for (index, step) in plan.steps().iter().enumerate() {
            let action = step.action();
            let number = index + 1;
            info!(resource = %id, step = number, total, %action, "Applying mutation step");

            let submitted = match action {
                StepAction::SetBounds { min, max } => self.mutator.set_bounds(min, max).await,
                StepAction::Resize { node_count } => self.mutator.resize(node_count).await,
            };
            if let Err(source) = submitted {
                warn!(resource = %id, step = number, %action, error = %source, "Mutation rejected");
                return Err(PlanAbort {
                    step: number,
                    total,
                    completed: index,
                    action,
                    cause: AbortCause::Rejected(source),
                });
            }

            match self.poller.await_state(id, &extract, step.wait()).await {
                Ok(Presence::Present(snapshot)) => last = Some(snapshot),
                Ok(Presence::Absent) => last = None,
                Err(cause) => {
                    return Err(PlanAbort {
                        step: number,
                        total,
                        completed: index,
                        action,
                        cause: AbortCause::Wait(cause),
                    });
                }
            }
        }

        Ok(last)
    }
}
