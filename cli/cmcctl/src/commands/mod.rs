//! CLI commands.

mod kubernetes;
mod redis;
mod volumes;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmccloud_provider::{logging, Config, Provider};

use crate::output::OutputFormat;

/// cmcctl - manage CMC Cloud clusters, Redis instances and volumes.
#[derive(Debug, Parser)]
#[command(name = "cmcctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// API base URL.
    #[arg(long, global = true, env = "CMC_API_URL")]
    api_url: Option<String>,

    /// API key.
    #[arg(long, global = true, env = "CMC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Project ID.
    #[arg(long, global = true, env = "CMC_PROJECT_ID")]
    project: Option<String>,

    /// Region ID.
    #[arg(long, global = true, env = "CMC_REGION_ID")]
    region: Option<String>,

    /// Log level or filter directive (RUST_LOG wins when set).
    #[arg(long, global = true, env = "CMC_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage Kubernetes clusters.
    Kubernetes(kubernetes::KubernetesCommand),

    /// Manage Redis instances.
    Redis(redis::RedisCommand),

    /// Attach and detach volumes.
    Volumes(volumes::VolumesCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let format = match self.format.as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        };

        if matches!(self.command, Commands::Version) {
            println!("cmcctl {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let config = self.config()?;
        logging::init(&config.log_level, config.log_format);

        let ctx = CommandContext { config, format };

        match self.command {
            Commands::Kubernetes(cmd) => cmd.run(ctx).await,
            Commands::Redis(cmd) => cmd.run(ctx).await,
            Commands::Volumes(cmd) => cmd.run(ctx).await,
            Commands::Version => Ok(()),
        }
    }

    /// Flags (already merged with their env vars by clap) take precedence;
    /// everything else comes from the environment.
    fn config(&self) -> Result<Config> {
        let config = Config::from_lookup(|name| {
            let flag = match name {
                "CMC_API_URL" => &self.api_url,
                "CMC_API_KEY" => &self.api_key,
                "CMC_PROJECT_ID" => &self.project,
                "CMC_REGION_ID" => &self.region,
                "CMC_LOG_LEVEL" => &self.log_level,
                _ => return std::env::var(name).ok(),
            };
            flag.clone()
        })?;
        Ok(config)
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
}

impl CommandContext {
    pub fn provider(&self) -> Result<Provider> {
        Ok(Provider::new(&self.config)?)
    }
}
