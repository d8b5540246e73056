//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::Result;

use crate::domain::config::SecurityRule;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts external process execution so infrastructure can be swapped
/// or mocked. One implementation covers all three process integrations
/// (cloud CLI, VM fan-out, remote shell) — argv in, streamed output out.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `argv`, streaming stdout line-by-line into the runner's
    /// category log (echoed to the console when verbose). Returns the
    /// captured non-empty lines in arrival order.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::CommandFailed` on non-zero exit — always
    /// fatal to the pipeline, never retried at this layer.
    async fn run(&self, argv: &[String]) -> Result<Vec<String>>;

    /// Run `argv` for its exit status only; all output is discarded.
    /// A non-zero exit is `Ok(false)`, not an error — used for preflight
    /// and propagation probes where failure is an expected answer.
    async fn probe(&self, argv: &[String]) -> Result<bool>;

    /// Run `argv` with `input` streamed to its stdin, stdout and stderr
    /// merged as they arrive into the log file `log_name`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned or a log
    /// write fails; the exit status is returned for the caller to judge.
    async fn run_with_stdin(
        &self,
        argv: &[String],
        input: &str,
        log_name: &str,
    ) -> Result<ExitStatus>;
}

// ── Cloud Control-Plane Ports ─────────────────────────────────────────────────

/// Resource group, key vault, and role-assignment operations.
#[allow(async_fn_in_trait)]
pub trait ResourceOps {
    /// Create the resource group this provisioner is scoped to.
    async fn create_resource_group(&self) -> Result<()>;
    /// Create a key vault inside the resource group.
    async fn create_key_vault(&self, vault: &str) -> Result<()>;
    /// Object id of the signed-in principal.
    async fn signed_in_user_id(&self) -> Result<String>;
    /// Id of the active subscription.
    async fn subscription_id(&self) -> Result<String>;
    /// Grant `role` to `assignee` on `scope`.
    async fn assign_vault_role(&self, role: &str, assignee: &str, scope: &str) -> Result<()>;
}

/// Key vault secret operations.
#[allow(async_fn_in_trait)]
pub trait VaultOps {
    /// Read-only probe: can the caller list secrets yet? Used to observe
    /// RBAC propagation; failure is an answer, not an error.
    async fn can_list_secrets(&self, vault: &str) -> bool;
    /// Write `value` under `name`.
    async fn set_secret(&self, vault: &str, name: &str, value: &str) -> Result<()>;
    /// Read the secret value (trimmed).
    async fn get_secret(&self, vault: &str, name: &str) -> Result<String>;
}

/// Virtual network, security group, and subnet operations.
#[allow(async_fn_in_trait)]
pub trait NetworkOps {
    async fn create_vnet(&self, name: &str, address_prefix: &str) -> Result<()>;
    async fn create_nsg(&self, name: &str) -> Result<()>;
    /// Create one inbound rule on `nsg`. The source scope defaults to
    /// virtual-network-internal when the rule leaves it unspecified.
    async fn create_nsg_rule(&self, nsg: &str, rule: &SecurityRule) -> Result<()>;
    /// Create the subnet and attach it to an already-created `nsg`.
    async fn create_subnet(&self, vnet: &str, name: &str, address_prefix: &str, nsg: &str)
        -> Result<()>;
}

/// Parameters for one VM creation.
pub struct VmLaunch<'a> {
    pub name: &'a str,
    pub image: &'a str,
    pub size: &'a str,
    pub admin_username: &'a str,
    pub vnet: &'a str,
    pub subnet: &'a str,
    /// Name of the public IP resource to attach; `None` requests an
    /// explicitly empty public address.
    pub public_ip: Option<&'a str>,
}

/// VM creation and address resolution.
#[allow(async_fn_in_trait)]
pub trait ComputeOps {
    /// Create one VM. Creations for different roles run concurrently.
    async fn create_vm(&self, launch: &VmLaunch<'_>) -> Result<()>;
    /// Private address of `vm` (trimmed).
    async fn private_ip(&self, vm: &str) -> Result<String>;
    /// Public address of `vm` (trimmed).
    async fn public_ip(&self, vm: &str) -> Result<String>;
}

/// Teardown operations used by `tierup cleanup`.
#[allow(async_fn_in_trait)]
pub trait CleanupOps {
    async fn delete_key_vault(&self, vault: &str) -> Result<()>;
    async fn delete_resource_group(&self) -> Result<()>;
    async fn purge_key_vault(&self, vault: &str) -> Result<()>;
}

/// Composite trait — any type implementing the provisioning sub-traits is
/// a `CloudProvisioner`.
pub trait CloudProvisioner: ResourceOps + VaultOps + NetworkOps + ComputeOps {}

impl<T> CloudProvisioner for T where T: ResourceOps + VaultOps + NetworkOps + ComputeOps {}

// ── Remote Execution Port ─────────────────────────────────────────────────────

/// Streams a local shell script to a remote host over SSH and executes it.
#[allow(async_fn_in_trait)]
pub trait ScriptRunner {
    /// Run `script` on `user@host` with trailing positional `params`,
    /// routed through `jump_host` when one is supplied. Returns the path
    /// of the log file holding the full transcript.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ScriptFailed` on non-zero remote exit.
    async fn run_script(
        &self,
        script: &Path,
        host: &str,
        user: &str,
        params: &[String],
        jump_host: Option<&str>,
    ) -> Result<PathBuf>;
}

// ── HTTP Probe Port ───────────────────────────────────────────────────────────

/// Abstracts HTTP health probing so the verifier can be tested with mocks.
#[allow(async_fn_in_trait)]
pub trait HttpProbe {
    /// Issue one GET and return the status code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not complete (connection
    /// refused, timeout, ...). The verifier treats errors as failed
    /// attempts, not as fatal conditions.
    async fn get_status(&self, url: &str) -> Result<u16>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit a phase header.
    fn header(&self, message: &str);
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
