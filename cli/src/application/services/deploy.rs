//! Application deployment stage — run the three tier setup scripts on
//! their VMs, innermost tier first.
//!
//! The database password is read back from the key vault rather than
//! taken from the local config, so the deployed credentials are exactly
//! the ones the vault holds. The private tiers are reached through the
//! frontend VM acting as SSH jump host; the frontend itself is reached
//! directly on its public address.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{ProgressReporter, ScriptRunner, VaultOps};
use crate::application::services::resources::DB_SECRET_NAME;
use crate::domain::config::{DeployConfig, BACKEND_ROLE, DB_ROLE, FRONTEND_ROLE};
use crate::domain::report::IpReport;

/// Setup script for the database tier.
pub const DB_SCRIPT: &str = "setup_db.sh";
/// Setup script for the backend tier.
pub const BACKEND_SCRIPT: &str = "setup_backend.sh";
/// Setup script for the frontend tier.
pub const FRONTEND_SCRIPT: &str = "setup_frontend.sh";

/// Run the three setup scripts in dependency order: db, backend,
/// frontend.
///
/// # Errors
///
/// Returns the first script failure; later tiers are not attempted.
pub async fn deploy_application(
    vault: &impl VaultOps,
    scripts: &impl ScriptRunner,
    reporter: &impl ProgressReporter,
    config: &DeployConfig,
    ips: &IpReport,
    scripts_dir: &Path,
) -> Result<()> {
    let db_vm = config.vm(DB_ROLE)?;
    let backend_vm = config.vm(BACKEND_ROLE)?;
    let frontend_vm = config.vm(FRONTEND_ROLE)?;

    let db_private = ips.private_ip(&db_vm.name)?;
    let backend_private = ips.private_ip(&backend_vm.name)?;
    let jump_host = ips.public_ip(&frontend_vm.name)?;

    reporter.step(&format!(
        "Reading secret '{DB_SECRET_NAME}' from key vault '{}'...",
        config.key_vault.name
    ));
    let db_password = vault
        .get_secret(&config.key_vault.name, DB_SECRET_NAME)
        .await?;
    let db = &config.database;

    reporter.header("Setting up database tier");
    let log = scripts
        .run_script(
            &scripts_dir.join(DB_SCRIPT),
            db_private,
            &db_vm.admin_username,
            &[
                db.port.to_string(),
                db.user.clone(),
                db_password.clone(),
                db.name.clone(),
            ],
            Some(jump_host),
        )
        .await?;
    reporter.success(&format!("Database ready. Logs saved to {}", log.display()));

    reporter.header("Setting up backend tier");
    let log = scripts
        .run_script(
            &scripts_dir.join(BACKEND_SCRIPT),
            backend_private,
            &backend_vm.admin_username,
            &[
                db_private.to_string(),
                db.port.to_string(),
                backend_vm.port.to_string(),
                db.user.clone(),
                db_password,
                db.name.clone(),
            ],
            Some(jump_host),
        )
        .await?;
    reporter.success(&format!("Backend ready. Logs saved to {}", log.display()));

    reporter.header("Setting up frontend tier");
    let log = scripts
        .run_script(
            &scripts_dir.join(FRONTEND_SCRIPT),
            jump_host,
            &frontend_vm.admin_username,
            &[
                backend_private.to_string(),
                backend_vm.port.to_string(),
                frontend_vm.port.to_string(),
            ],
            None,
        )
        .await?;
    reporter.success(&format!("Frontend ready. Logs saved to {}", log.display()));
    Ok(())
}
