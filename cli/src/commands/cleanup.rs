//! `tierup cleanup` — tear down everything a deployment created.
//!
//! Order matters: the vault is deleted before its resource group so the
//! soft-deleted vault can be purged, and the group delete runs without
//! waiting so the (slow) teardown continues server-side.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::application::ports::CleanupOps;
use crate::domain::DeployConfig;
use crate::output::OutputContext;

/// Arguments for the cleanup command.
#[derive(Args)]
pub struct CleanupArgs {
    /// Path to the deployment configuration
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Run `tierup cleanup`.
///
/// # Errors
///
/// Returns an error if a teardown command fails or the confirmation
/// prompt cannot be read.
pub async fn run(
    ctx: &OutputContext,
    cloud: &impl CleanupOps,
    config: &DeployConfig,
    yes: bool,
) -> Result<()> {
    if !ctx.quiet {
        println!();
        println!("This will permanently remove:");
        println!(
            "  • Resource group '{}' and everything in it",
            config.resource_group
        );
        println!(
            "  • Key vault '{}' (including its secrets)",
            config.key_vault.name
        );
        println!();
    }

    if !yes && !confirm("Continue?")? {
        println!("Cancelled.");
        return Ok(());
    }

    ctx.info(&format!("Deleting key vault '{}'...", config.key_vault.name));
    cloud.delete_key_vault(&config.key_vault.name).await?;

    ctx.info(&format!(
        "Deleting resource group '{}' (runs in the background)...",
        config.resource_group
    ));
    cloud.delete_resource_group().await?;

    ctx.info(&format!("Purging key vault '{}'...", config.key_vault.name));
    cloud.purge_key_vault(&config.key_vault.name).await?;

    ctx.success("Cleanup started. Resources disappear as the group delete completes.");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("read confirmation")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::Result;

    use super::*;

    #[derive(Default)]
    struct CleanupMock {
        ops: Mutex<Vec<&'static str>>,
    }

    impl CleanupOps for CleanupMock {
        async fn delete_key_vault(&self, _vault: &str) -> Result<()> {
            self.ops.lock().expect("lock").push("vault");
            Ok(())
        }

        async fn delete_resource_group(&self) -> Result<()> {
            self.ops.lock().expect("lock").push("group");
            Ok(())
        }

        async fn purge_key_vault(&self, _vault: &str) -> Result<()> {
            self.ops.lock().expect("lock").push("purge");
            Ok(())
        }
    }

    fn config() -> DeployConfig {
        DeployConfig::parse(
            r#"
resource_group: pc-rg
location: westeurope
network:
  vnet_name: pc-vnet
  vnet_address: 10.0.0.0/16
  subnets:
    app: { name: app-subnet, address: 10.0.1.0/24, nsg_name: app-nsg }
database: { name: petclinic, user: pcadmin, password: hunter2, port: 5432 }
compute:
  db_vm: { name: pc-db, size: s, image: u, admin_username: a, subnet: app, port: 5432 }
  backend_vm: { name: pc-backend, size: s, image: u, admin_username: a, subnet: app, port: 9966 }
  frontend_vm: { name: pc-frontend, size: s, image: u, admin_username: a, subnet: app, port: 80, public_ip: pc-ip }
key_vault: { name: pc-kv }
"#,
        )
        .expect("config parses")
    }

    #[tokio::test]
    async fn test_cleanup_deletes_vault_then_group_then_purges() {
        let ctx = OutputContext::new(true, true);
        let cloud = CleanupMock::default();

        run(&ctx, &cloud, &config(), true).await.expect("cleanup ok");
        assert_eq!(
            cloud.ops.lock().expect("lock").clone(),
            ["vault", "group", "purge"]
        );
    }
}
