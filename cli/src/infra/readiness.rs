//! Waiters for eventually-consistent external state.
//!
//! Two flavors with deliberately different failure policies:
//! [`wait_for_port`] (SSH readiness) is fatal on timeout, while
//! [`wait_until`] (RBAC propagation) reports non-convergence and lets the
//! caller decide — the dependent operation may succeed shortly after.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::domain::error::DeployError;

/// Port probed for host readiness.
pub const SSH_PORT: u16 = 22;
/// Overall budget for a host's SSH port to open.
pub const SSH_TIMEOUT: Duration = Duration::from_secs(300);
/// Fixed pause between SSH connection attempts (no backoff growth).
pub const SSH_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Per-attempt TCP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default budget for RBAC propagation.
pub const PROPAGATION_MAX_WAIT: Duration = Duration::from_secs(180);
/// Default pause between propagation probes.
pub const PROPAGATION_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Propagation budget, injectable so tests never sleep for minutes.
#[derive(Debug, Clone, Copy)]
pub struct PropagationBudget {
    pub max_wait: Duration,
    pub interval: Duration,
}

impl Default for PropagationBudget {
    fn default() -> Self {
        Self {
            max_wait: PROPAGATION_MAX_WAIT,
            interval: PROPAGATION_POLL_INTERVAL,
        }
    }
}

/// Outcome of a propagation wait.
#[derive(Debug, Clone, Copy)]
pub struct Propagation {
    pub converged: bool,
    pub elapsed: Duration,
}

/// Poll a TCP connect to `host:port` every `interval` until it succeeds
/// or `timeout` elapses. Any socket error (refusal, unreachable, connect
/// timeout) counts as "not ready yet".
///
/// # Errors
///
/// Returns `DeployError::SshTimeout` once `timeout` is exceeded — fatal,
/// there is no degraded continuation.
pub async fn wait_for_port(
    host: &str,
    port: u16,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        let attempt = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await;
        if matches!(attempt, Ok(Ok(_))) {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
    Err(DeployError::SshTimeout {
        host: host.to_string(),
        timeout_secs: timeout.as_secs(),
    }
    .into())
}

/// Invoke `probe` every `interval` until it returns `true` or `max_wait`
/// is exceeded. Never blocks past the budget and never errors; a
/// non-converged result is the caller's cue to log a warning and proceed.
pub async fn wait_until<F, Fut>(mut probe: F, max_wait: Duration, interval: Duration) -> Propagation
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    loop {
        if probe().await {
            return Propagation {
                converged: true,
                elapsed: start.elapsed(),
            };
        }
        if start.elapsed() + interval >= max_wait {
            return Propagation {
                converged: false,
                elapsed: start.elapsed(),
            };
        }
        tokio::time::sleep(interval).await;
    }
}
