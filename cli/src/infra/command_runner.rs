//! Streaming process execution — the production `CommandRunner`.
//!
//! One abstraction covers all three external-process integrations (cloud
//! CLI calls, the VM creation fan-out, and the remote shell): spawn with
//! piped streams, consume stdout incrementally so long-running calls show
//! progress, append every line to the run's log directory, and surface a
//! non-zero exit as a typed fatal error.

use std::io::Write as _;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::application::ports::CommandRunner;
use crate::domain::error::DeployError;
use crate::infra::logs::DeployContext;

/// Log file receiving every cloud-CLI invocation of the run.
pub const CLOUD_LOG: &str = "azure.log";

/// Production `CommandRunner` — tokio process execution with streamed
/// stdout and per-category log files. Cheap to construct; each instance
/// writes `run` output to one fixed log file.
pub struct StreamingRunner {
    ctx: Arc<DeployContext>,
    log_name: &'static str,
}

impl StreamingRunner {
    /// Runner whose `run` output lands in [`CLOUD_LOG`].
    #[must_use]
    pub fn new(ctx: Arc<DeployContext>) -> Self {
        Self::with_log(ctx, CLOUD_LOG)
    }

    /// Runner writing to a custom category log.
    #[must_use]
    pub fn with_log(ctx: Arc<DeployContext>, log_name: &'static str) -> Self {
        Self { ctx, log_name }
    }

    /// Drain the child's stdout line-by-line: log, optionally echo, and
    /// collect non-empty lines in order.
    async fn drain_stdout(
        &self,
        stdout: tokio::process::ChildStdout,
        command: &str,
    ) -> Result<Vec<String>> {
        let mut log = self.ctx.open_log(self.log_name)?;
        writeln!(log, "--- {command} ---").context("write log header")?;

        let mut lines = Vec::new();
        let mut reader = BufReader::new(stdout).lines();
        while let Some(line) = reader.next_line().await.context("read child stdout")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            writeln!(log, "{line}").context("append log line")?;
            if self.ctx.verbose {
                println!("  {line}");
            }
            lines.push(line.to_string());
        }
        Ok(lines)
    }
}

fn split(argv: &[String]) -> Result<(&String, &[String])> {
    argv.split_first().context("empty command line")
}

impl CommandRunner for StreamingRunner {
    async fn run(&self, argv: &[String]) -> Result<Vec<String>> {
        let (program, args) = split(argv)?;
        let command = argv.join(" ");

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let stdout = child.stdout.take().context("child stdout missing")?;
        let mut stderr = child.stderr.take().context("child stderr missing")?;

        // Stdout is consumed while the process runs; stderr is read
        // concurrently so neither pipe can fill up and block the child.
        let (lines, stderr_buf) = tokio::join!(self.drain_stdout(stdout, &command), async {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });
        let lines = lines?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))?;
        if !status.success() {
            return Err(DeployError::CommandFailed {
                command,
                code: status.code().unwrap_or(-1),
                stderr: stderr_buf.trim().to_string(),
            }
            .into());
        }
        Ok(lines)
    }

    async fn probe(&self, argv: &[String]) -> Result<bool> {
        let (program, args) = split(argv)?;
        let status = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("failed to spawn {program}"))?;
        Ok(status.success())
    }

    async fn run_with_stdin(
        &self,
        argv: &[String],
        input: &str,
        log_name: &str,
    ) -> Result<ExitStatus> {
        let (program, args) = split(argv)?;

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        // Feed stdin in its own task, closing the pipe afterwards so the
        // remote `bash -s` sees end-of-script.
        let mut stdin = child.stdin.take().context("child stdin missing")?;
        let body = input.as_bytes().to_vec();
        let stdin_task = tokio::spawn(async move {
            let _ = stdin.write_all(&body).await;
            let _ = stdin.shutdown().await;
        });

        let stdout = child.stdout.take().context("child stdout missing")?;
        let stderr = child.stderr.take().context("child stderr missing")?;

        // Merge stdout and stderr as they arrive: both readers feed one
        // channel, the single writer owns the log file.
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let out_task = tokio::spawn(forward_lines(stdout, tx.clone()));
        let err_task = tokio::spawn(forward_lines(stderr, tx));

        let mut log = self.ctx.open_log(log_name)?;
        while let Some(line) = rx.recv().await {
            writeln!(log, "{line}").context("append script log line")?;
            if self.ctx.verbose {
                println!("{line}");
            }
        }

        let _ = tokio::join!(stdin_task, out_task, err_task);
        child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, tx: mpsc::UnboundedSender<String>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}
