//! cmcctl - operator CLI for CMC Cloud resources.
//!
//! Drives the same operations the provider exposes: every mutating command
//! waits for the resource to converge before returning.

use anyhow::Result;
use clap::Parser;

mod commands;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
