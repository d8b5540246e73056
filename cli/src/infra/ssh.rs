//! Remote script execution over SSH, optionally through a jump host.
//!
//! Host-key verification is disabled on purpose: the VMs are freshly
//! created on every run, so pinning would always prompt. This trades
//! security for unattended automation.
//!
//! The script is never uploaded — its literal contents are streamed into
//! a remote `bash -s`, with positional parameters appended to the remote
//! command. The combined transcript lands in a log file named after the
//! script.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ScriptRunner};
use crate::domain::error::DeployError;
use crate::infra::logs::DeployContext;

/// Production `ScriptRunner` — shells out to the `ssh` binary through a
/// `CommandRunner`.
pub struct ScriptExecutor<R: CommandRunner> {
    runner: R,
    ctx: Arc<DeployContext>,
}

impl<R: CommandRunner> ScriptExecutor<R> {
    #[must_use]
    pub fn new(runner: R, ctx: Arc<DeployContext>) -> Self {
        Self { runner, ctx }
    }
}

/// Build the ssh argv: host-key checks off, a single `-J` proxy hop when
/// a jump host is given, and `bash -s <params...>` as the remote command.
#[must_use]
pub fn build_ssh_argv(
    host: &str,
    user: &str,
    params: &[String],
    jump_host: Option<&str>,
) -> Vec<String> {
    let mut argv: Vec<String> = [
        "ssh",
        "-o",
        "StrictHostKeyChecking=no",
        "-o",
        "UserKnownHostsFile=/dev/null",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();

    if let Some(jump) = jump_host {
        argv.push("-J".to_string());
        argv.push(format!("{user}@{jump}"));
    }

    argv.push(format!("{user}@{host}"));

    let mut remote = String::from("bash -s");
    for param in params {
        remote.push(' ');
        remote.push_str(param);
    }
    argv.push(remote);
    argv
}

/// Log file name for a script: `setup_db.sh` logs to `setup_db.log`.
fn log_name_for(script: &Path) -> String {
    let stem = script
        .file_stem()
        .map_or_else(|| "script".to_string(), |s| s.to_string_lossy().to_string());
    format!("{stem}.log")
}

impl<R: CommandRunner> ScriptRunner for ScriptExecutor<R> {
    async fn run_script(
        &self,
        script: &Path,
        host: &str,
        user: &str,
        params: &[String],
        jump_host: Option<&str>,
    ) -> Result<PathBuf> {
        let body = tokio::fs::read_to_string(script)
            .await
            .with_context(|| format!("read script {}", script.display()))?;

        let argv = build_ssh_argv(host, user, params, jump_host);
        let log_name = log_name_for(script);
        let log_path = self.ctx.log_path(&log_name);

        let status = self.runner.run_with_stdin(&argv, &body, &log_name).await?;
        if !status.success() {
            return Err(DeployError::ScriptFailed {
                script: script.display().to_string(),
                host: host.to_string(),
                code: status.code().unwrap_or(-1),
                log: log_path.display().to_string(),
            }
            .into());
        }
        Ok(log_path)
    }
}
