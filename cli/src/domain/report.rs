//! IP report — the addresses resolved after compute provisioning.
//!
//! Produced once by the compute stage, read-only afterwards. Either the
//! report carries an entry per compute role or the run aborted before the
//! report existed; there is no partial report.

use std::collections::HashMap;

use anyhow::{Context, Result};

/// Addresses of one VM.
#[derive(Debug, Clone)]
pub struct VmAddresses {
    pub private: String,
    /// Present only for VMs that requested a public IP.
    pub public: Option<String>,
}

/// Mapping from VM name to its resolved addresses.
#[derive(Debug, Default)]
pub struct IpReport {
    entries: HashMap<String, VmAddresses>,
}

impl IpReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vm_name: String, addresses: VmAddresses) {
        self.entries.insert(vm_name, addresses);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Private address of `vm_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the VM is not in the report.
    pub fn private_ip(&self, vm_name: &str) -> Result<&str> {
        Ok(&self
            .entries
            .get(vm_name)
            .with_context(|| format!("no IP report entry for VM '{vm_name}'"))?
            .private)
    }

    /// Public address of `vm_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the VM is not in the report or has no public IP.
    pub fn public_ip(&self, vm_name: &str) -> Result<&str> {
        self.entries
            .get(vm_name)
            .with_context(|| format!("no IP report entry for VM '{vm_name}'"))?
            .public
            .as_deref()
            .with_context(|| format!("VM '{vm_name}' has no public IP"))
    }

    /// Iterate over `(vm_name, addresses)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VmAddresses)> {
        self.entries.iter()
    }
}
