//! Per-run deployment context — verbosity flag plus the log directory.
//!
//! The context is created once at process start and shared by reference
//! for the whole run. Log file handles are opened per call, never held
//! open, so each component appends to its own named file without any two
//! writers sharing a handle.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

/// Immutable per-run settings shared by every component that produces
/// output.
#[derive(Debug)]
pub struct DeployContext {
    /// Echo every captured line to the console as it arrives.
    pub verbose: bool,
    log_dir: PathBuf,
}

impl DeployContext {
    #[must_use]
    pub fn new(verbose: bool, log_dir: PathBuf) -> Self {
        Self { verbose, log_dir }
    }

    /// Context with a fresh timestamp-named directory under `logs/`.
    #[must_use]
    pub fn timestamped(verbose: bool) -> Self {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        Self::new(verbose, PathBuf::from("logs").join(stamp.to_string()))
    }

    /// Full path of the log file `name` inside the run's directory.
    #[must_use]
    pub fn log_path(&self, name: &str) -> PathBuf {
        self.log_dir.join(name)
    }

    /// Open `name` for appending, creating the log directory lazily and
    /// idempotently on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn open_log(&self, name: &str) -> Result<File> {
        std::fs::create_dir_all(&self.log_dir)
            .with_context(|| format!("create log directory {}", self.log_dir.display()))?;
        let path = self.log_path(name);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))
    }

    /// The run's log directory.
    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}
