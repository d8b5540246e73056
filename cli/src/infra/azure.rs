//! Azure CLI adapter — routes every control-plane call through a
//! `CommandRunner`.
//!
//! Generic over `R: CommandRunner` so that tests can inject a recording
//! runner without spawning real processes. The adapter depends only on
//! process exit codes and stdout/stderr text; it parses nothing beyond
//! trimming `-o tsv` responses.

use anyhow::{Context, Result};

use crate::application::ports::{
    CleanupOps, CommandRunner, ComputeOps, NetworkOps, ResourceOps, VaultOps, VmLaunch,
};
use crate::domain::config::SecurityRule;

/// Source scope applied to rules that leave `source` unspecified.
const DEFAULT_RULE_SOURCE: &str = "VirtualNetwork";

/// Verify that the Azure CLI is installed and the user is logged in.
/// Both checks are probes: output is discarded, only the exit status
/// matters. A spawn failure (binary not on PATH) counts as not installed.
///
/// # Errors
///
/// Returns an actionable error naming the missing prerequisite.
pub async fn preflight(runner: &impl CommandRunner) -> Result<()> {
    let installed = runner.probe(&az(["--version"])).await.unwrap_or(false);
    anyhow::ensure!(
        installed,
        "Azure CLI (az) is not installed.\n\
         Install it: https://learn.microsoft.com/en-us/cli/azure/install-azure-cli"
    );

    let logged_in = runner.probe(&az(["account", "show"])).await.unwrap_or(false);
    anyhow::ensure!(logged_in, "Not logged in to Azure. Run 'az login' first.");
    Ok(())
}

/// Production cloud provisioner — shells out to the `az` binary, scoped
/// to one resource group and location for the whole run.
pub struct AzureCli<R: CommandRunner> {
    runner: R,
    resource_group: String,
    location: String,
}

impl<R: CommandRunner> AzureCli<R> {
    #[must_use]
    pub fn new(runner: R, resource_group: String, location: String) -> Self {
        Self {
            runner,
            resource_group,
            location,
        }
    }

    async fn tsv(&self, argv: &[String]) -> Result<String> {
        let lines = self.runner.run(argv).await?;
        Ok(lines.join("\n").trim().to_string())
    }
}

fn az<'a>(args: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    std::iter::once("az")
        .chain(args)
        .map(str::to_owned)
        .collect()
}

impl<R: CommandRunner> ResourceOps for AzureCli<R> {
    async fn create_resource_group(&self) -> Result<()> {
        self.runner
            .run(&az([
                "group",
                "create",
                "--name",
                self.resource_group.as_str(),
                "--location",
                self.location.as_str(),
            ]))
            .await?;
        Ok(())
    }

    async fn create_key_vault(&self, vault: &str) -> Result<()> {
        self.runner
            .run(&az([
                "keyvault",
                "create",
                "--name",
                vault,
                "-g",
                self.resource_group.as_str(),
                "-l",
                self.location.as_str(),
            ]))
            .await?;
        Ok(())
    }

    async fn signed_in_user_id(&self) -> Result<String> {
        self.tsv(&az([
            "ad",
            "signed-in-user",
            "show",
            "--query",
            "id",
            "-o",
            "tsv",
        ]))
        .await
        .context("resolve signed-in user object id")
    }

    async fn subscription_id(&self) -> Result<String> {
        self.tsv(&az(["account", "show", "--query", "id", "-o", "tsv"]))
            .await
            .context("resolve subscription id")
    }

    async fn assign_vault_role(&self, role: &str, assignee: &str, scope: &str) -> Result<()> {
        self.runner
            .run(&az([
                "role",
                "assignment",
                "create",
                "--role",
                role,
                "--assignee-object-id",
                assignee,
                "--assignee-principal-type",
                "User",
                "--scope",
                scope,
            ]))
            .await?;
        Ok(())
    }
}

impl<R: CommandRunner> VaultOps for AzureCli<R> {
    async fn can_list_secrets(&self, vault: &str) -> bool {
        self.runner
            .probe(&az([
                "keyvault",
                "secret",
                "list",
                "--vault-name",
                vault,
                "--query",
                "[]",
                "-o",
                "tsv",
            ]))
            .await
            .unwrap_or(false)
    }

    async fn set_secret(&self, vault: &str, name: &str, value: &str) -> Result<()> {
        self.runner
            .run(&az([
                "keyvault",
                "secret",
                "set",
                "--vault-name",
                vault,
                "--name",
                name,
                "--value",
                value,
            ]))
            .await?;
        Ok(())
    }

    async fn get_secret(&self, vault: &str, name: &str) -> Result<String> {
        self.tsv(&az([
            "keyvault",
            "secret",
            "show",
            "--vault-name",
            vault,
            "--name",
            name,
            "--query",
            "value",
            "-o",
            "tsv",
        ]))
        .await
        .with_context(|| format!("read secret '{name}' from vault '{vault}'"))
    }
}

impl<R: CommandRunner> NetworkOps for AzureCli<R> {
    async fn create_vnet(&self, name: &str, address_prefix: &str) -> Result<()> {
        self.runner
            .run(&az([
                "network",
                "vnet",
                "create",
                "-g",
                self.resource_group.as_str(),
                "-l",
                self.location.as_str(),
                "-n",
                name,
                "--address-prefix",
                address_prefix,
            ]))
            .await?;
        Ok(())
    }

    async fn create_nsg(&self, name: &str) -> Result<()> {
        self.runner
            .run(&az([
                "network",
                "nsg",
                "create",
                "-g",
                self.resource_group.as_str(),
                "-l",
                self.location.as_str(),
                "-n",
                name,
            ]))
            .await?;
        Ok(())
    }

    async fn create_nsg_rule(&self, nsg: &str, rule: &SecurityRule) -> Result<()> {
        let priority = rule.priority.to_string();
        let port = rule.port.to_string();
        let source = rule.source.as_deref().unwrap_or(DEFAULT_RULE_SOURCE);
        self.runner
            .run(&az([
                "network",
                "nsg",
                "rule",
                "create",
                "-g",
                self.resource_group.as_str(),
                "--nsg-name",
                nsg,
                "--name",
                rule.name.as_str(),
                "--priority",
                priority.as_str(),
                "--destination-port-range",
                port.as_str(),
                "--access",
                rule.access.as_str(),
                "--protocol",
                rule.protocol.as_str(),
                "--direction",
                "Inbound",
                "--source-address-prefix",
                source,
                "--destination-address-prefix",
                "*",
                "--source-port-range",
                "*",
            ]))
            .await?;
        Ok(())
    }

    async fn create_subnet(
        &self,
        vnet: &str,
        name: &str,
        address_prefix: &str,
        nsg: &str,
    ) -> Result<()> {
        self.runner
            .run(&az([
                "network",
                "vnet",
                "subnet",
                "create",
                "-g",
                self.resource_group.as_str(),
                "--vnet-name",
                vnet,
                "-n",
                name,
                "--address-prefix",
                address_prefix,
                "--network-security-group",
                nsg,
            ]))
            .await?;
        Ok(())
    }
}

impl<R: CommandRunner> ComputeOps for AzureCli<R> {
    async fn create_vm(&self, launch: &VmLaunch<'_>) -> Result<()> {
        // NIC-level NSG is explicitly empty: filtering happens at the
        // subnet's security group. Likewise an absent public IP must be
        // requested as an empty string or the CLI would allocate one.
        self.runner
            .run(&az([
                "vm",
                "create",
                "-g",
                self.resource_group.as_str(),
                "-l",
                self.location.as_str(),
                "-n",
                launch.name,
                "--image",
                launch.image,
                "--size",
                launch.size,
                "--admin-username",
                launch.admin_username,
                "--vnet-name",
                launch.vnet,
                "--subnet",
                launch.subnet,
                "--nsg",
                "",
                "--generate-ssh-keys",
                "--public-ip-address",
                launch.public_ip.unwrap_or(""),
            ]))
            .await?;
        Ok(())
    }

    async fn private_ip(&self, vm: &str) -> Result<String> {
        self.tsv(&az([
            "vm",
            "list-ip-addresses",
            "-g",
            self.resource_group.as_str(),
            "-n",
            vm,
            "--query",
            "[0].virtualMachine.network.privateIpAddresses[0]",
            "-o",
            "tsv",
        ]))
        .await
        .with_context(|| format!("resolve private IP of '{vm}'"))
    }

    async fn public_ip(&self, vm: &str) -> Result<String> {
        self.tsv(&az([
            "vm",
            "list-ip-addresses",
            "-g",
            self.resource_group.as_str(),
            "-n",
            vm,
            "--query",
            "[0].virtualMachine.network.publicIpAddresses[0].ipAddress",
            "-o",
            "tsv",
        ]))
        .await
        .with_context(|| format!("resolve public IP of '{vm}'"))
    }
}

impl<R: CommandRunner> CleanupOps for AzureCli<R> {
    async fn delete_key_vault(&self, vault: &str) -> Result<()> {
        self.runner
            .run(&az([
                "keyvault",
                "delete",
                "--name",
                vault,
                "--resource-group",
                self.resource_group.as_str(),
            ]))
            .await?;
        Ok(())
    }

    async fn delete_resource_group(&self) -> Result<()> {
        self.runner
            .run(&az([
                "group",
                "delete",
                "--name",
                self.resource_group.as_str(),
                "--yes",
                "--no-wait",
            ]))
            .await?;
        Ok(())
    }

    async fn purge_key_vault(&self, vault: &str) -> Result<()> {
        self.runner
            .run(&az(["keyvault", "purge", "--name", vault, "--no-wait"]))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::application::services::test_support::RecordingRunner;

    use super::*;

    fn cli(runner: RecordingRunner) -> AzureCli<RecordingRunner> {
        AzureCli::new(runner, "pc-rg".to_string(), "westeurope".to_string())
    }

    #[tokio::test]
    async fn test_create_resource_group_argv() {
        let cli = cli(RecordingRunner::default());
        cli.create_resource_group().await.expect("create");
        assert_eq!(
            cli.runner.joined_calls(),
            ["az group create --name pc-rg --location westeurope"]
        );
    }

    #[tokio::test]
    async fn test_nsg_rule_defaults_source_to_virtual_network() {
        let cli = cli(RecordingRunner::default());
        let rule = SecurityRule {
            name: "allow-ssh".to_string(),
            priority: 100,
            port: 22,
            protocol: "Tcp".to_string(),
            access: "Allow".to_string(),
            source: None,
        };
        cli.create_nsg_rule("app-nsg", &rule).await.expect("rule");
        let call = cli.runner.joined_calls().pop().expect("one call");
        assert!(call.contains("--source-address-prefix VirtualNetwork"));
        assert!(call.contains("--priority 100"));
        assert!(call.contains("--destination-port-range 22"));
        assert!(call.contains("--direction Inbound"));
    }

    #[tokio::test]
    async fn test_nsg_rule_uses_explicit_source_when_given() {
        let cli = cli(RecordingRunner::default());
        let rule = SecurityRule {
            name: "allow-http".to_string(),
            priority: 110,
            port: 80,
            protocol: "Tcp".to_string(),
            access: "Allow".to_string(),
            source: Some("Internet".to_string()),
        };
        cli.create_nsg_rule("app-nsg", &rule).await.expect("rule");
        let call = cli.runner.joined_calls().pop().expect("one call");
        assert!(call.contains("--source-address-prefix Internet"));
    }

    #[tokio::test]
    async fn test_create_vm_without_public_ip_passes_empty_string() {
        let cli = cli(RecordingRunner::default());
        let launch = VmLaunch {
            name: "pc-db",
            image: "Ubuntu2204",
            size: "Standard_B1s",
            admin_username: "azureuser",
            vnet: "pc-vnet",
            subnet: "data-subnet",
            public_ip: None,
        };
        cli.create_vm(&launch).await.expect("create");
        let calls = cli.runner.calls();
        let argv = &calls[0];
        let pos = argv
            .iter()
            .position(|a| a == "--public-ip-address")
            .expect("flag present");
        assert_eq!(argv[pos + 1], "");
        assert!(argv.contains(&"--generate-ssh-keys".to_string()));
    }

    #[tokio::test]
    async fn test_create_vm_with_public_ip_names_the_resource() {
        let cli = cli(RecordingRunner::default());
        let launch = VmLaunch {
            name: "pc-frontend",
            image: "Ubuntu2204",
            size: "Standard_B1s",
            admin_username: "azureuser",
            vnet: "pc-vnet",
            subnet: "app-subnet",
            public_ip: Some("pc-frontend-ip"),
        };
        cli.create_vm(&launch).await.expect("create");
        let call = cli.runner.joined_calls().pop().expect("one call");
        assert!(call.ends_with("--public-ip-address pc-frontend-ip"));
    }

    #[tokio::test]
    async fn test_get_secret_trims_tsv_response() {
        let runner = RecordingRunner::default();
        runner.reply_with(vec!["s3cret".to_string()]);
        let cli = cli(runner);
        let value = cli.get_secret("pc-kv", "db-password").await.expect("get");
        assert_eq!(value, "s3cret");
    }

    #[tokio::test]
    async fn test_preflight_fails_when_cli_probe_fails() {
        let runner = RecordingRunner::default();
        runner.probe_replies(vec![false]);
        let err = preflight(&runner).await.expect_err("must fail");
        assert!(err.to_string().contains("not installed"));
    }

    #[tokio::test]
    async fn test_preflight_fails_when_not_logged_in() {
        let runner = RecordingRunner::default();
        runner.probe_replies(vec![true, false]);
        let err = preflight(&runner).await.expect_err("must fail");
        assert!(err.to_string().contains("az login"));
    }

    #[tokio::test]
    async fn test_preflight_passes_when_both_probes_succeed() {
        let runner = RecordingRunner::default();
        runner.probe_replies(vec![true, true]);
        preflight(&runner).await.expect("preflight ok");
    }
}
