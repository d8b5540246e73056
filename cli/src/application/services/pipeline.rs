//! The deployment pipeline — fixed stage order from empty subscription
//! to verified application.
//!
//! Resources, network, compute, SSH readiness, deployment, verification.
//! The first failed stage aborts the run; already-created resources are
//! left in place for `cleanup` to remove.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CloudProvisioner, HttpProbe, ProgressReporter, ScriptRunner};
use crate::application::services::verify::{base_url, VERIFY_SPACING};
use crate::application::services::{compute, deploy, network, resources, verify};
use crate::domain::config::{DeployConfig, FRONTEND_ROLE};
use crate::infra::readiness::{
    wait_for_port, PropagationBudget, SSH_POLL_INTERVAL, SSH_PORT, SSH_TIMEOUT,
};

/// Wait knobs for the pipeline, injectable so tests never sleep at
/// production scale (and can point the SSH probe at a local listener).
pub struct PipelineTiming {
    pub propagation: PropagationBudget,
    pub ssh_port: u16,
    pub ssh_timeout: Duration,
    pub ssh_interval: Duration,
    pub verify_spacing: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            propagation: PropagationBudget::default(),
            ssh_port: SSH_PORT,
            ssh_timeout: SSH_TIMEOUT,
            ssh_interval: SSH_POLL_INTERVAL,
            verify_spacing: VERIFY_SPACING,
        }
    }
}

/// Run the whole deployment.
///
/// # Errors
///
/// Returns the first stage failure. Verification never contributes one;
/// unhealthy endpoints only warn.
pub async fn run_pipeline(
    cloud: &impl CloudProvisioner,
    scripts: &impl ScriptRunner,
    http: &impl HttpProbe,
    reporter: &impl ProgressReporter,
    config: &DeployConfig,
    scripts_dir: &Path,
    timing: PipelineTiming,
) -> Result<()> {
    resources::provision_resources(cloud, reporter, config, timing.propagation).await?;
    network::provision_network(cloud, reporter, &config.network).await?;
    let ips = compute::provision_compute(cloud, reporter, config).await?;

    let frontend = config.vm(FRONTEND_ROLE)?;
    let public_ip = ips.public_ip(&frontend.name)?;

    reporter.header("Waiting for SSH");
    reporter.step(&format!(
        "Waiting for {public_ip}:{} (up to {}s)...",
        timing.ssh_port,
        timing.ssh_timeout.as_secs()
    ));
    wait_for_port(
        public_ip,
        timing.ssh_port,
        timing.ssh_timeout,
        timing.ssh_interval,
    )
    .await?;
    reporter.success("SSH is reachable.");

    deploy::deploy_application(cloud, scripts, reporter, config, &ips, scripts_dir).await?;

    let base = base_url(public_ip, frontend.port);
    verify::verify_deployment(http, reporter, &base, timing.verify_spacing).await;

    reporter.header("Deployment complete");
    reporter.success(&format!("Application: {base}/petclinic/"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::Result;

    use crate::application::ports::{
        ComputeOps, HttpProbe, NetworkOps, ResourceOps, ScriptRunner, VaultOps, VmLaunch,
    };
    use crate::application::services::test_support::RecordingReporter;
    use crate::domain::config::SecurityRule;

    use super::*;

    fn config_with_frontend_ip(ip: &str) -> DeployConfig {
        DeployConfig::parse(&format!(
            r#"
resource_group: pc-rg
location: westeurope
network:
  vnet_name: pc-vnet
  vnet_address: 10.0.0.0/16
  subnets:
    app: {{ name: app-subnet, address: 10.0.1.0/24, nsg_name: app-nsg }}
database: {{ name: petclinic, user: pcadmin, password: hunter2, port: 5432 }}
compute:
  db_vm: {{ name: pc-db, size: s, image: u, admin_username: a, subnet: app, port: 5432 }}
  backend_vm: {{ name: pc-backend, size: s, image: u, admin_username: a, subnet: app, port: 9966 }}
  frontend_vm: {{ name: {ip}, size: s, image: u, admin_username: a, subnet: app, port: 80, public_ip: pc-ip }}
key_vault: {{ name: pc-kv }}
"#
        ))
        .expect("config parses")
    }

    fn tiny_timing(ssh_port: u16) -> PipelineTiming {
        PipelineTiming {
            propagation: PropagationBudget {
                max_wait: Duration::from_millis(50),
                interval: Duration::from_millis(10),
            },
            ssh_port,
            ssh_timeout: Duration::from_millis(500),
            ssh_interval: Duration::from_millis(10),
            verify_spacing: Duration::ZERO,
        }
    }

    /// Full-stack cloud double; the frontend VM "name" doubles as the
    /// public address so the SSH wait can target a real local listener.
    #[derive(Default)]
    struct CloudMock {
        stages: Mutex<Vec<&'static str>>,
        fail_vnet: bool,
    }

    impl CloudMock {
        fn mark(&self, stage: &'static str) {
            let mut stages = self.stages.lock().expect("lock");
            if stages.last() != Some(&stage) {
                stages.push(stage);
            }
        }

        fn stages(&self) -> Vec<&'static str> {
            self.stages.lock().expect("lock").clone()
        }
    }

    impl ResourceOps for CloudMock {
        async fn create_resource_group(&self) -> Result<()> {
            self.mark("resources");
            Ok(())
        }

        async fn create_key_vault(&self, _vault: &str) -> Result<()> {
            self.mark("resources");
            Ok(())
        }

        async fn signed_in_user_id(&self) -> Result<String> {
            Ok("oid".to_string())
        }

        async fn subscription_id(&self) -> Result<String> {
            Ok("sub".to_string())
        }

        async fn assign_vault_role(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    impl VaultOps for CloudMock {
        async fn can_list_secrets(&self, _vault: &str) -> bool {
            true
        }

        async fn set_secret(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn get_secret(&self, _: &str, _: &str) -> Result<String> {
            Ok("vault-password".to_string())
        }
    }

    impl NetworkOps for CloudMock {
        async fn create_vnet(&self, _: &str, _: &str) -> Result<()> {
            self.mark("network");
            if self.fail_vnet {
                anyhow::bail!("address space in use");
            }
            Ok(())
        }

        async fn create_nsg(&self, _: &str) -> Result<()> {
            self.mark("network");
            Ok(())
        }

        async fn create_nsg_rule(&self, _: &str, _: &SecurityRule) -> Result<()> {
            self.mark("network");
            Ok(())
        }

        async fn create_subnet(&self, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
            self.mark("network");
            Ok(())
        }
    }

    impl ComputeOps for CloudMock {
        async fn create_vm(&self, _launch: &VmLaunch<'_>) -> Result<()> {
            self.mark("compute");
            Ok(())
        }

        async fn private_ip(&self, _vm: &str) -> Result<String> {
            Ok("10.0.1.4".to_string())
        }

        async fn public_ip(&self, vm: &str) -> Result<String> {
            // The mock's frontend "name" is its address.
            Ok(vm.to_string())
        }
    }

    #[derive(Default)]
    struct ScriptsMock {
        runs: Mutex<Vec<String>>,
    }

    impl ScriptRunner for ScriptsMock {
        async fn run_script(
            &self,
            script: &Path,
            _host: &str,
            _user: &str,
            _params: &[String],
            _jump_host: Option<&str>,
        ) -> Result<PathBuf> {
            self.runs
                .lock()
                .expect("lock")
                .push(script.display().to_string());
            Ok(PathBuf::from("logs/x.log"))
        }
    }

    struct HealthyProbe;

    impl HttpProbe for HealthyProbe {
        async fn get_status(&self, _url: &str) -> Result<u16> {
            Ok(200)
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_fixed_order_through_deploy_and_verify() {
        // The SSH wait targets a real loopback listener.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let ssh_port = listener.local_addr().expect("addr").port();

        let cloud = CloudMock::default();
        let scripts = ScriptsMock::default();
        let reporter = RecordingReporter::default();
        let config = config_with_frontend_ip("127.0.0.1");

        run_pipeline(
            &cloud,
            &scripts,
            &HealthyProbe,
            &reporter,
            &config,
            Path::new("scripts"),
            tiny_timing(ssh_port),
        )
        .await
        .expect("pipeline ok");

        assert_eq!(cloud.stages(), ["resources", "network", "compute"]);
        let runs = scripts.runs.lock().expect("lock").clone();
        assert_eq!(runs.len(), 3);
        assert!(runs[0].ends_with("setup_db.sh"));
        assert!(runs[1].ends_with("setup_backend.sh"));
        assert!(runs[2].ends_with("setup_frontend.sh"));
        let (_, summary) = reporter
            .messages()
            .into_iter()
            .filter(|(kind, _)| *kind == "success")
            .last()
            .expect("summary line");
        assert!(summary.contains("http://127.0.0.1/petclinic/"));
    }

    #[tokio::test]
    async fn test_network_failure_stops_before_compute() {
        let cloud = CloudMock {
            fail_vnet: true,
            ..CloudMock::default()
        };
        let scripts = ScriptsMock::default();
        let err = run_pipeline(
            &cloud,
            &scripts,
            &HealthyProbe,
            &RecordingReporter::default(),
            &config_with_frontend_ip("127.0.0.1"),
            Path::new("scripts"),
            tiny_timing(2222),
        )
        .await
        .expect_err("vnet failure must abort");

        assert!(err.to_string().contains("address space in use"));
        assert_eq!(cloud.stages(), ["resources", "network"]);
        assert!(scripts.runs.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_ssh_timeout_stops_before_deploy() {
        // A bound-then-dropped listener yields a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let dead_port = listener.local_addr().expect("addr").port();
        drop(listener);

        let cloud = CloudMock::default();
        let scripts = ScriptsMock::default();
        let err = run_pipeline(
            &cloud,
            &scripts,
            &HealthyProbe,
            &RecordingReporter::default(),
            &config_with_frontend_ip("127.0.0.1"),
            Path::new("scripts"),
            tiny_timing(dead_port),
        )
        .await
        .expect_err("unreachable SSH must abort");

        assert!(err.to_string().contains("SSH"));
        assert!(scripts.runs.lock().expect("lock").is_empty());
    }
}
