//! Deployment configuration — YAML model, loading, and semantic validation.
//!
//! Subnets and compute roles are declared as maps whose iteration order is
//! significant (security rules must land on an already-created group, and
//! the provisioning log reads in document order), so both use `IndexMap`.

use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::domain::error::ConfigError;

/// Compute role holding the database tier.
pub const DB_ROLE: &str = "db_vm";
/// Compute role holding the backend tier.
pub const BACKEND_ROLE: &str = "backend_vm";
/// Compute role holding the frontend tier (the only public-facing VM,
/// doubling as the SSH jump host for the private tiers).
pub const FRONTEND_ROLE: &str = "frontend_vm";

/// Top-level deployment configuration, loaded from `config.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    pub resource_group: String,
    pub location: String,
    pub network: NetworkSpec,
    pub database: DatabaseSpec,
    pub compute: IndexMap<String, VmSpec>,
    pub key_vault: KeyVaultSpec,
}

/// Virtual network and its subnets.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSpec {
    pub vnet_name: String,
    pub vnet_address: String,
    pub subnets: IndexMap<String, SubnetSpec>,
}

/// One subnet plus its security group and inbound rules.
#[derive(Debug, Clone, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    pub address: String,
    pub nsg_name: String,
    #[serde(default)]
    pub rules: Vec<SecurityRule>,
}

/// One inbound security-group rule. Priorities are caller-supplied and
/// must be unique per group; the cloud rejects duplicates at create time.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityRule {
    pub name: String,
    pub priority: u16,
    pub port: u16,
    pub protocol: String,
    pub access: String,
    /// Source address scope. Defaults to virtual-network-internal
    /// traffic when unspecified.
    #[serde(default)]
    pub source: Option<String>,
}

/// Database tier settings. The password is written to the key vault
/// during provisioning and read back from it during deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSpec {
    pub name: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

/// One VM to create.
#[derive(Debug, Clone, Deserialize)]
pub struct VmSpec {
    pub name: String,
    pub size: String,
    pub image: String,
    pub admin_username: String,
    /// Key into `network.subnets`. Must resolve — checked by `validate`.
    pub subnet: String,
    /// Service port exposed by this tier.
    pub port: u16,
    /// Name of the public IP resource to attach. `None` means the VM
    /// gets no public address at all.
    #[serde(default)]
    pub public_ip: Option<String>,
}

/// Key vault settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyVaultSpec {
    pub name: String,
}

impl DeployConfig {
    /// Load and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, fails to parse, or fails
    /// semantic validation.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Invalid {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text (no validation).
    ///
    /// # Errors
    ///
    /// Returns the YAML deserialization error verbatim.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Semantic validation: subnet references must resolve and the three
    /// deployment roles must be present.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (role, vm) in &self.compute {
            if !self.network.subnets.contains_key(&vm.subnet) {
                let available = self
                    .network
                    .subnets
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ConfigError::UnknownSubnet {
                    vm: role.clone(),
                    subnet: vm.subnet.clone(),
                    available,
                });
            }
        }
        for role in [DB_ROLE, BACKEND_ROLE, FRONTEND_ROLE] {
            if !self.compute.contains_key(role) {
                return Err(ConfigError::MissingRole(role.to_string()));
            }
        }
        Ok(())
    }

    /// Look up the VM spec for a deployment role.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRole` if the role is absent (cannot
    /// happen after `validate`).
    pub fn vm(&self, role: &str) -> Result<&VmSpec, ConfigError> {
        self.compute
            .get(role)
            .ok_or_else(|| ConfigError::MissingRole(role.to_string()))
    }
}
