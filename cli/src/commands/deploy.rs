//! `tierup deploy` — provision the infrastructure and deploy the
//! application end to end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::application::services::pipeline::{self, PipelineTiming};
use crate::domain::DeployConfig;
use crate::infra::azure::{self, AzureCli};
use crate::infra::command_runner::StreamingRunner;
use crate::infra::http::ReqwestProbe;
use crate::infra::logs::DeployContext;
use crate::infra::ssh::ScriptExecutor;
use crate::output::{OutputContext, TerminalReporter};

/// Arguments for the deploy command.
#[derive(Args)]
pub struct DeployArgs {
    /// Path to the deployment configuration
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Directory holding the tier setup scripts
    #[arg(long, default_value = "scripts")]
    pub scripts_dir: PathBuf,
}

/// Run `tierup deploy`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a prerequisite is
/// missing, or any pipeline stage fails.
pub async fn run(ctx: &OutputContext, args: &DeployArgs, verbose: bool) -> Result<()> {
    let config = DeployConfig::load(&args.config)?;

    let deploy_ctx = Arc::new(DeployContext::timestamped(verbose));
    ctx.kv("Config", &args.config.display().to_string());
    ctx.kv("Logs", &deploy_ctx.log_dir().display().to_string());

    let runner = StreamingRunner::new(Arc::clone(&deploy_ctx));
    azure::preflight(&runner).await?;

    let cloud = AzureCli::new(
        runner,
        config.resource_group.clone(),
        config.location.clone(),
    );
    let scripts = ScriptExecutor::new(
        StreamingRunner::new(Arc::clone(&deploy_ctx)),
        Arc::clone(&deploy_ctx),
    );
    let http = ReqwestProbe::new()?;
    let reporter = TerminalReporter::new(ctx);

    pipeline::run_pipeline(
        &cloud,
        &scripts,
        &http,
        &reporter,
        &config,
        &args.scripts_dir,
        PipelineTiming::default(),
    )
    .await
}
