//! Volume attachment commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use cmccloud_id::{ServerId, VolumeId};
use cmccloud_provider::api::VolumeAttachmentDetail;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_output, print_single, print_success, OutputFormat};

use super::CommandContext;

/// Volume commands.
#[derive(Debug, Args)]
pub struct VolumesCommand {
    #[command(subcommand)]
    command: VolumesSubcommand,
}

#[derive(Debug, Subcommand)]
enum VolumesSubcommand {
    /// Attach a volume to a server and wait until it is attached.
    Attach(AttachArgs),

    /// Detach a volume from a server and wait until it is detached.
    Detach(DetachArgs),
}

#[derive(Debug, Args)]
struct AttachArgs {
    /// Volume ID.
    volume: VolumeId,

    /// Server ID.
    #[arg(long)]
    server: ServerId,

    /// Delete the volume when the server is terminated.
    #[arg(long)]
    delete_on_termination: bool,
}

#[derive(Debug, Args)]
struct DetachArgs {
    /// Volume ID.
    volume: VolumeId,

    /// Server ID.
    #[arg(long)]
    server: ServerId,
}

#[derive(Debug, Serialize, Tabled)]
struct AttachmentRow {
    #[tabled(rename = "Volume")]
    volume_id: String,
    #[tabled(rename = "Server")]
    server_id: String,
    #[tabled(rename = "Delete on termination")]
    delete_on_termination: bool,
}

impl From<&VolumeAttachmentDetail> for AttachmentRow {
    fn from(detail: &VolumeAttachmentDetail) -> Self {
        Self {
            volume_id: detail.volume_id.to_string(),
            server_id: detail.server_id.to_string(),
            delete_on_termination: detail.delete_on_termination,
        }
    }
}

impl VolumesCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let provider = ctx.provider()?;
        let attachments = provider.volume_attachments();

        match self.command {
            VolumesSubcommand::Attach(args) => {
                let detail = attachments
                    .attach(&args.volume, &args.server, args.delete_on_termination)
                    .await?;
                if ctx.format == OutputFormat::Table {
                    print_success(&format!("Attached {} to {}", args.volume, args.server));
                }
                print_output(&[AttachmentRow::from(&detail)], ctx.format);
            }
            VolumesSubcommand::Detach(args) => {
                attachments.detach(&args.volume, &args.server).await?;
                match ctx.format {
                    OutputFormat::Json => print_single(&serde_json::json!({
                        "volume_id": args.volume.to_string(),
                        "server_id": args.server.to_string(),
                        "attached": false,
                    })),
                    OutputFormat::Table => {
                        print_success(&format!("Detached {} from {}", args.volume, args.server))
                    }
                }
            }
        }
        Ok(())
    }
}
