//! apt-get driver
//!
//! The package manager is treated as an opaque command: it either succeeds
//! or fails, and its output goes straight to the user's terminal without
//! being parsed.
//!
//! # Architecture
//!
//! - `PackageManager`: the two operations the provisioner needs
//! - `AptGet`: runs the real program (or only records it in dry-run mode)
//! - `PlannedCommand`: one command line, kept for logging and the report

use crate::error::CommandError;
use crate::packages::PackageRequest;
use serde::Serialize;
use std::fmt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};

/// Keeps debconf from prompting; stdin is closed anyway.
const NONINTERACTIVE_ENV: (&str, &str) = ("DEBIAN_FRONTEND", "noninteractive");

/// Operations the provisioner needs from the package manager.
pub trait PackageManager {
    /// Refresh the local package index (`apt-get update`).
    fn refresh_index(&mut self) -> Result<(), CommandError>;

    /// Install or upgrade every package in `request`.
    fn install(&mut self, request: &PackageRequest) -> Result<(), CommandError>;

    /// Commands issued so far, in order.
    fn commands(&self) -> &[PlannedCommand] {
        &[]
    }
}

/// A single package manager command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlannedCommand {
    fn new(program: &Path, args: &[&str]) -> Self {
        Self {
            program: program.display().to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

impl fmt::Display for PlannedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// `apt-get` invoked as a child process.
#[derive(Debug, Clone)]
pub struct AptGet {
    program: PathBuf,
    dry_run: bool,
    history: Vec<PlannedCommand>,
}

impl AptGet {
    /// Create a driver for `program`, resolved on PATH if not absolute.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            dry_run: false,
            history: Vec::new(),
        }
    }

    /// Record commands instead of running them.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    fn execute(&mut self, args: &[&str]) -> Result<(), CommandError> {
        let planned = PlannedCommand::new(&self.program, args);
        let line = planned.to_string();

        if self.dry_run {
            info!("[dry-run] would run: {}", line);
            self.history.push(planned);
            return Ok(());
        }

        info!("Running: {}", line);

        let status = Command::new(&self.program)
            .args(args)
            .env(NONINTERACTIVE_ENV.0, NONINTERACTIVE_ENV.1)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| CommandError::spawn(self.program.display().to_string(), e))?;

        self.history.push(planned);
        debug!("{} finished: {}", line, status);

        check_status(line, status)
    }
}

impl PackageManager for AptGet {
    fn refresh_index(&mut self) -> Result<(), CommandError> {
        self.execute(&["update", "-qq"])
    }

    fn install(&mut self, request: &PackageRequest) -> Result<(), CommandError> {
        let mut args = vec!["install", "-y"];
        args.extend_from_slice(request.names());
        self.execute(&args)
    }

    fn commands(&self) -> &[PlannedCommand] {
        &self.history
    }
}

/// Map a finished child's status to success or a `CommandError`.
fn check_status(command: String, status: ExitStatus) -> Result<(), CommandError> {
    if status.success() {
        return Ok(());
    }

    match (status.code(), status.signal()) {
        (Some(code), _) => Err(CommandError::Exited { command, code }),
        (None, Some(signal)) => Err(CommandError::Signaled { command, signal }),
        // Stopped/continued statuses never reach here from status()
        (None, None) => Err(CommandError::Exited { command, code: 1 }),
    }
}
