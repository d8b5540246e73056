//! Resource provisioning stage — resource group, key vault, RBAC grant,
//! propagation wait, and the database secret.
//!
//! Every command failure here is fatal and halts the pipeline; only the
//! RBAC propagation wait is allowed to time out, because the subsequent
//! secret write may still succeed once the role assignment lands.

use anyhow::Result;

use crate::application::ports::{ProgressReporter, ResourceOps, VaultOps};
use crate::domain::DeployConfig;
use crate::infra::readiness::{wait_until, PropagationBudget};

/// Fixed name under which the database password is stored in the vault.
pub const DB_SECRET_NAME: &str = "db-password";
/// Role granting the caller secret read/write on the vault scope.
pub const VAULT_ROLE: &str = "Key Vault Secrets Officer";

/// Vault-scoped authorization target for the role assignment.
#[must_use]
pub fn vault_scope(subscription: &str, resource_group: &str, vault: &str) -> String {
    format!(
        "/subscriptions/{subscription}/resourceGroups/{resource_group}\
         /providers/Microsoft.KeyVault/vaults/{vault}"
    )
}

/// Run the resource stage in order: group, vault, role grant, propagation
/// wait, secret write.
///
/// # Errors
///
/// Returns the first command failure; a propagation timeout is only a
/// warning.
pub async fn provision_resources(
    cloud: &(impl ResourceOps + VaultOps),
    reporter: &impl ProgressReporter,
    config: &DeployConfig,
    budget: PropagationBudget,
) -> Result<()> {
    let vault = &config.key_vault.name;

    reporter.header("Creating resource group");
    cloud.create_resource_group().await?;

    reporter.header("Creating key vault");
    cloud.create_key_vault(vault).await?;

    reporter.header("Assigning key vault role");
    let object_id = cloud.signed_in_user_id().await?;
    let subscription = cloud.subscription_id().await?;
    let scope = vault_scope(&subscription, &config.resource_group, vault);
    cloud
        .assign_vault_role(VAULT_ROLE, &object_id, &scope)
        .await?;

    reporter.step(&format!(
        "Waiting for RBAC propagation (up to {}s)...",
        budget.max_wait.as_secs()
    ));
    let outcome = wait_until(
        || cloud.can_list_secrets(vault),
        budget.max_wait,
        budget.interval,
    )
    .await;
    if outcome.converged {
        reporter.success(&format!(
            "Key vault access confirmed after {}s.",
            outcome.elapsed.as_secs()
        ));
    } else {
        reporter.warn("RBAC propagation timeout - proceeding anyway.");
    }

    reporter.step(&format!(
        "Storing secret '{DB_SECRET_NAME}' in key vault '{vault}'..."
    ));
    cloud
        .set_secret(vault, DB_SECRET_NAME, &config.database.password)
        .await?;
    Ok(())
}
