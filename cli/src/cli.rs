//! CLI argument parsing with clap derive

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::domain::DeployConfig;
use crate::infra::azure::AzureCli;
use crate::infra::command_runner::StreamingRunner;
use crate::infra::logs::DeployContext;
use crate::output::OutputContext;

/// Three-tier application deployment to Azure
#[derive(Parser)]
#[command(
    name = "tierup",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Echo external command output to the console
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision infrastructure and deploy the application
    Deploy(commands::deploy::DeployArgs),

    /// Remove every resource the deployment created
    Cleanup(commands::cleanup::CleanupArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            verbose,
            quiet,
            no_color,
            command,
        } = self;
        match command {
            Command::Version => {
                commands::version::run();
                Ok(())
            }
            Command::Deploy(args) => {
                let ctx = OutputContext::new(no_color, quiet);
                commands::deploy::run(&ctx, &args, verbose).await
            }
            Command::Cleanup(args) => {
                let ctx = OutputContext::new(no_color, quiet);
                let config = DeployConfig::load(&args.config)?;
                let deploy_ctx = Arc::new(DeployContext::timestamped(verbose));
                let cloud = AzureCli::new(
                    StreamingRunner::new(deploy_ctx),
                    config.resource_group.clone(),
                    config.location.clone(),
                );
                commands::cleanup::run(&ctx, &cloud, &config, args.yes).await
            }
        }
    }
}
