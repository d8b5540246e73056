//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator. Fatal kinds abort the pipeline at
//! the point of failure; nothing already created is rolled back — cleanup
//! is a separate, idempotent tool (`tierup cleanup`).

use thiserror::Error;

/// Fatal failures raised by the deployment pipeline.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The cloud CLI (or any external process) exited non-zero.
    /// Never retried; the whole run aborts.
    #[error("command failed (exit code {code}): {command}\n{stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The SSH port never opened within the readiness budget.
    #[error("SSH timeout after {timeout_secs}s for {host}")]
    SshTimeout { host: String, timeout_secs: u64 },

    /// A remote setup script exited non-zero. The transcript is always
    /// on disk so the operator can inspect it.
    #[error("script {script} failed on {host} (exit code {code}); logs saved to {log}")]
    ScriptFailed {
        script: String,
        host: String,
        code: i32,
        log: String,
    },

    /// One of the parallel VM creations failed. Even if the other VMs
    /// succeeded, the run does not continue.
    #[error("VM creation failed for '{role}': {reason}")]
    VmCreateFailed { role: String, reason: String },
}

/// Errors raised while loading or validating the deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file '{0}' not found")]
    NotFound(String),

    #[error("invalid configuration in '{path}': {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "VM '{vm}' references subnet '{subnet}' which is not defined in \
         network.subnets (available: {available})"
    )]
    UnknownSubnet {
        vm: String,
        subnet: String,
        available: String,
    },

    #[error("compute role '{0}' is required for deployment but missing from config")]
    MissingRole(String),
}
