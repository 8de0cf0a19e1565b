//! Redis instance commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use cmccloud_id::{RedisInstanceId, SecurityGroupId};
use cmccloud_provider::resources::RedisInstanceState;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{or_dash, print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Redis commands.
#[derive(Debug, Args)]
pub struct RedisCommand {
    #[command(subcommand)]
    command: RedisSubcommand,
}

#[derive(Debug, Subcommand)]
enum RedisSubcommand {
    /// Show an instance with its billing mode and security groups.
    Get(InstanceArgs),

    /// Attach a security group and wait until the instance lists it.
    AttachSg(SecurityGroupArgs),

    /// Detach a security group and wait until the instance drops it.
    DetachSg(SecurityGroupArgs),

    /// Delete an instance and wait until it is gone.
    Delete(InstanceArgs),
}

#[derive(Debug, Args)]
struct InstanceArgs {
    /// Instance ID.
    id: RedisInstanceId,
}

#[derive(Debug, Args)]
struct SecurityGroupArgs {
    /// Instance ID.
    id: RedisInstanceId,

    /// Security group ID.
    security_group: SecurityGroupId,
}

#[derive(Debug, Serialize, Tabled)]
struct InstanceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Billing")]
    billing_mode: String,
    #[tabled(rename = "Security groups")]
    security_groups: String,
}

impl From<&RedisInstanceState> for InstanceRow {
    fn from(state: &RedisInstanceState) -> Self {
        let instance = &state.instance;
        let groups: Vec<String> = state.security_group_ids.iter().map(|g| g.to_string()).collect();
        Self {
            id: instance.id.to_string(),
            name: instance.name.clone(),
            status: instance.status.clone(),
            engine: format!(
                "{} {} ({})",
                instance.datastore_name, instance.datastore_version, instance.datastore_mode
            ),
            billing_mode: or_dash(state.billing_mode),
            security_groups: if groups.is_empty() {
                "-".to_string()
            } else {
                groups.join(", ")
            },
        }
    }
}

impl RedisCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let provider = ctx.provider()?;
        let instances = provider.redis_instances();

        match self.command {
            RedisSubcommand::Get(args) => {
                let state = instances.read(&args.id).await?;
                print_output(&[InstanceRow::from(&state)], ctx.format);
            }
            RedisSubcommand::AttachSg(args) => {
                instances
                    .attach_security_group(&args.id, &args.security_group)
                    .await?;
                report(
                    ctx.format,
                    &args,
                    true,
                    format!("Attached {} to {}", args.security_group, args.id),
                );
            }
            RedisSubcommand::DetachSg(args) => {
                instances
                    .detach_security_group(&args.id, &args.security_group)
                    .await?;
                report(
                    ctx.format,
                    &args,
                    false,
                    format!("Detached {} from {}", args.security_group, args.id),
                );
            }
            RedisSubcommand::Delete(args) => {
                instances.delete(&args.id).await?;
                match ctx.format {
                    OutputFormat::Json => print_single(&serde_json::json!({
                        "instance_id": args.id.to_string(),
                        "deleted": true,
                    })),
                    OutputFormat::Table => {
                        print_success(&format!("Deleted Redis instance {}", args.id))
                    }
                }
            }
        }
        Ok(())
    }
}

fn report(format: OutputFormat, args: &SecurityGroupArgs, attached: bool, message: String) {
    match format {
        OutputFormat::Json => print_single(&serde_json::json!({
            "instance_id": args.id.to_string(),
            "security_group_id": args.security_group.to_string(),
            "attached": attached,
        })),
        OutputFormat::Table => print_success(&message),
    }
}
