//! Domain layer — configuration model, the IP report, and typed errors.
//!
//! Apart from reading the configuration file itself, this module performs
//! no I/O and imports nothing from `crate::infra`, `crate::commands`, or
//! `crate::application`.

pub mod config;
pub mod error;
pub mod report;

pub use config::DeployConfig;
pub use error::DeployError;
pub use report::{IpReport, VmAddresses};
