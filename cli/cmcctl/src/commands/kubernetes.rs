//! Kubernetes cluster commands.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use cmccloud_converge::WorkerPoolState;
use cmccloud_id::ClusterId;
use cmccloud_provider::resources::{KubernetesState, WorkerPlan, WorkerPoolUpdate};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{or_dash, print_info, print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Kubernetes commands.
#[derive(Debug, Args)]
pub struct KubernetesCommand {
    #[command(subcommand)]
    command: KubernetesSubcommand,
}

#[derive(Debug, Subcommand)]
enum KubernetesSubcommand {
    /// Show a cluster and its default worker pool.
    Get(GetArgs),

    /// Change the default worker pool's node count or autoscaling bounds.
    Scale(ScaleArgs),

    /// Delete a cluster and wait until it is gone.
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
struct GetArgs {
    /// Cluster ID.
    id: ClusterId,
}

#[derive(Debug, Args)]
struct ScaleArgs {
    /// Cluster ID.
    id: ClusterId,

    /// Desired worker node count.
    #[arg(long)]
    node_count: Option<u32>,

    /// Desired autoscaling minimum.
    #[arg(long)]
    min_node_count: Option<u32>,

    /// Desired autoscaling maximum.
    #[arg(long)]
    max_node_count: Option<u32>,

    /// Print the plan without changing anything.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Cluster ID.
    id: ClusterId,
}

#[derive(Debug, Serialize, Tabled)]
struct ClusterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Masters")]
    master_count: u32,
    #[tabled(rename = "Workers")]
    worker_count: String,
    #[tabled(rename = "Min")]
    min_node_count: String,
    #[tabled(rename = "Max")]
    max_node_count: String,
    #[tabled(rename = "Master billing")]
    master_billing_mode: String,
    #[tabled(rename = "Worker billing")]
    worker_billing_mode: String,
}

impl From<&KubernetesState> for ClusterRow {
    fn from(state: &KubernetesState) -> Self {
        let pool = state.default_worker.pool;
        Self {
            id: state.cluster.id.to_string(),
            name: state.cluster.name.clone(),
            status: state.cluster.status.clone(),
            master_count: state.default_master.node_count,
            worker_count: or_dash(pool.map(|p| p.node_count)),
            min_node_count: or_dash(pool.map(|p| p.min_node_count)),
            max_node_count: or_dash(pool.map(|p| p.max_node_count)),
            master_billing_mode: or_dash(state.default_master.billing_mode),
            worker_billing_mode: or_dash(state.default_worker.billing_mode),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct PlanStepRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Pool after")]
    pool_after: String,
}

#[derive(Debug, Serialize)]
struct PlanView {
    cluster_id: String,
    node_group_id: String,
    order: String,
    current: String,
    desired: String,
    steps: Vec<PlanStepRow>,
    applied: bool,
}

impl KubernetesCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            KubernetesSubcommand::Get(args) => get(ctx, args).await,
            KubernetesSubcommand::Scale(args) => scale(ctx, args).await,
            KubernetesSubcommand::Delete(args) => delete(ctx, args).await,
        }
    }
}

async fn get(ctx: CommandContext, args: GetArgs) -> Result<()> {
    let provider = ctx.provider()?;
    let state = provider.kubernetes().read(&args.id).await?;
    print_output(&[ClusterRow::from(&state)], ctx.format);
    Ok(())
}

async fn scale(ctx: CommandContext, args: ScaleArgs) -> Result<()> {
    let provider = ctx.provider()?;
    let clusters = provider.kubernetes();

    let state = clusters.read(&args.id).await?;
    let current = state
        .default_worker
        .pool
        .ok_or_else(|| anyhow!("cluster {} has no default worker node group", args.id))?;
    let update = worker_update(current, &args)?;

    let worker_plan = clusters.plan_worker_update(&args.id, &update).await?;
    let mut view = plan_view(&args.id, &worker_plan);

    if ctx.format == OutputFormat::Table {
        print_info(&format!(
            "Worker pool {} -> {} ({})",
            view.current, view.desired, view.order
        ));
        print_output(&view.steps, ctx.format);
    }

    if args.dry_run || worker_plan.plan.is_empty() {
        match ctx.format {
            OutputFormat::Json => print_single(&view),
            OutputFormat::Table if args.dry_run => print_info("Dry run, nothing changed."),
            OutputFormat::Table => print_info("Worker pool already matches."),
        }
        return Ok(());
    }

    clusters.apply_worker_plan(&args.id, &worker_plan).await?;
    view.applied = true;

    match ctx.format {
        OutputFormat::Json => print_single(&view),
        OutputFormat::Table => print_success(&format!(
            "Scaled cluster {} to {}",
            args.id, view.desired
        )),
    }
    Ok(())
}

async fn delete(ctx: CommandContext, args: DeleteArgs) -> Result<()> {
    let provider = ctx.provider()?;
    provider.kubernetes().delete(&args.id).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "cluster_id": args.id.to_string(),
            "deleted": true,
        })),
        OutputFormat::Table => print_success(&format!("Deleted cluster {}", args.id)),
    }
    Ok(())
}

/// Unset flags keep the current value and are not marked as changed.
fn worker_update(current: WorkerPoolState, args: &ScaleArgs) -> Result<WorkerPoolUpdate> {
    if args.node_count.is_none() && args.min_node_count.is_none() && args.max_node_count.is_none()
    {
        bail!("nothing to change: pass --node-count, --min-node-count or --max-node-count");
    }

    Ok(WorkerPoolUpdate {
        desired: WorkerPoolState::new(
            args.node_count.unwrap_or(current.node_count),
            args.min_node_count.unwrap_or(current.min_node_count),
            args.max_node_count.unwrap_or(current.max_node_count),
        ),
        node_count_changed: args.node_count.is_some(),
        min_node_count_changed: args.min_node_count.is_some(),
        max_node_count_changed: args.max_node_count.is_some(),
    })
}

fn plan_view(id: &ClusterId, worker_plan: &WorkerPlan) -> PlanView {
    let current = worker_plan.change.current();
    let mut pool = current;
    let steps = worker_plan
        .plan
        .actions()
        .into_iter()
        .enumerate()
        .map(|(index, action)| {
            pool = action.apply(pool);
            PlanStepRow {
                step: index + 1,
                action: action.to_string(),
                pool_after: pool.to_string(),
            }
        })
        .collect();

    PlanView {
        cluster_id: id.to_string(),
        node_group_id: worker_plan.node_group.id.to_string(),
        order: worker_plan.plan.order().to_string(),
        current: current.to_string(),
        desired: worker_plan.change.desired().to_string(),
        steps,
        applied: false,
    }
}
