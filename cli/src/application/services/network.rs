//! Network provisioning stage — vnet, then per subnet: security group,
//! its inbound rules, and the subnet attachment.
//!
//! Ordering matters twice: every rule targets a group that must already
//! exist, and every subnet attaches to a group that must already carry
//! its rules. Subnets are processed strictly in declaration order.

use anyhow::Result;

use crate::application::ports::{NetworkOps, ProgressReporter};
use crate::domain::config::NetworkSpec;

/// Run the network stage for every declared subnet.
///
/// # Errors
///
/// Any command failure is fatal; nothing in this stage is retried.
pub async fn provision_network(
    cloud: &impl NetworkOps,
    reporter: &impl ProgressReporter,
    network: &NetworkSpec,
) -> Result<()> {
    reporter.header("Creating virtual network");
    cloud
        .create_vnet(&network.vnet_name, &network.vnet_address)
        .await?;

    for (key, subnet) in &network.subnets {
        reporter.header(&format!("Configuring subnet '{key}'"));

        reporter.step(&format!("Creating security group '{}'...", subnet.nsg_name));
        cloud.create_nsg(&subnet.nsg_name).await?;

        for rule in &subnet.rules {
            reporter.step(&format!(
                "Adding rule '{}' (port {})...",
                rule.name, rule.port
            ));
            cloud.create_nsg_rule(&subnet.nsg_name, rule).await?;
        }

        reporter.step(&format!("Creating subnet '{}'...", subnet.name));
        cloud
            .create_subnet(
                &network.vnet_name,
                &subnet.name,
                &subnet.address,
                &subnet.nsg_name,
            )
            .await?;
    }
    Ok(())
}
