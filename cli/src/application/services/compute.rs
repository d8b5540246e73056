//! Compute provisioning stage — concurrent VM creation and sequential
//! address resolution.
//!
//! All creations are launched before any is awaited, so a slow VM never
//! delays the start of another. Failures are collected per role: every
//! role gets a success or failure report, then the first failure aborts
//! the pipeline.

use anyhow::{Context, Result};
use futures_util::future::join_all;

use crate::application::ports::{ComputeOps, ProgressReporter, VmLaunch};
use crate::domain::config::DeployConfig;
use crate::domain::error::DeployError;
use crate::domain::report::{IpReport, VmAddresses};

/// Create every configured VM concurrently, then resolve addresses.
///
/// # Errors
///
/// Returns `DeployError::VmCreateFailed` for the first role whose
/// creation failed (after reporting all outcomes), or an IP resolution
/// failure.
pub async fn provision_compute(
    cloud: &impl ComputeOps,
    reporter: &impl ProgressReporter,
    config: &DeployConfig,
) -> Result<IpReport> {
    reporter.header("Creating virtual machines");

    let creations = config.compute.iter().map(|(role, vm)| async move {
        let subnet = config
            .network
            .subnets
            .get(&vm.subnet)
            .with_context(|| format!("VM '{role}' references unknown subnet '{}'", vm.subnet))?;
        let launch = VmLaunch {
            name: &vm.name,
            image: &vm.image,
            size: &vm.size,
            admin_username: &vm.admin_username,
            vnet: &config.network.vnet_name,
            subnet: &subnet.name,
            public_ip: vm.public_ip.as_deref(),
        };
        cloud.create_vm(&launch).await
    });
    let outcomes = join_all(creations).await;

    let mut first_failure = None;
    for ((role, vm), outcome) in config.compute.iter().zip(outcomes) {
        match outcome {
            Ok(()) => reporter.success(&format!("VM '{}' created.", vm.name)),
            Err(err) => {
                reporter.warn(&format!("VM '{}' failed: {err:#}", vm.name));
                if first_failure.is_none() {
                    first_failure = Some(DeployError::VmCreateFailed {
                        role: role.clone(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }
    }
    if let Some(failure) = first_failure {
        return Err(failure.into());
    }

    reporter.header("Resolving IP addresses");
    let mut report = IpReport::new();
    for vm in config.compute.values() {
        let private = cloud.private_ip(&vm.name).await?;
        let public = match vm.public_ip {
            Some(_) => Some(cloud.public_ip(&vm.name).await?),
            None => None,
        };
        match &public {
            Some(public) => reporter.step(&format!(
                "{}: private {private}, public {public}",
                vm.name
            )),
            None => reporter.step(&format!("{}: private {private}", vm.name)),
        }
        report.insert(vm.name.clone(), VmAddresses { private, public });
    }
    Ok(report)
}
