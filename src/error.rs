//! Error handling module for sshd-prep
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every error is fatal; `ProvisionError::exit_code` maps each one to the
//! process exit status.

use crate::provision_state::TransitionError;
use nix::sys::signal::Signal;
use thiserror::Error;

/// Exit status used when the privilege check fails.
pub const EXIT_INSUFFICIENT_PRIVILEGE: u8 = 1;

/// Exit status for errors that have no more specific code.
pub const EXIT_GENERAL: u8 = 1;

/// Shell convention for "command not found".
pub const EXIT_COMMAND_NOT_FOUND: u8 = 127;

/// Shell convention for "found but not executable".
pub const EXIT_COMMAND_NOT_EXECUTABLE: u8 = 126;

/// Main error type for sshd-prep
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The process is not running with effective uid 0
    #[error("Root privileges required (effective uid is {euid})")]
    InsufficientPrivilege { euid: u32 },

    /// `apt-get update` failed
    #[error("Package index refresh failed")]
    IndexRefresh(#[source] CommandError),

    /// `apt-get install` failed
    #[error("Package install failed")]
    Install(#[source] CommandError),

    /// A requested package name is malformed or the request is empty
    #[error("Invalid package request: {0}")]
    InvalidPackageName(String),

    /// Provisioning steps were driven out of order
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// IO errors (writing the report, etc.)
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    /// Create an invalid package request error
    pub fn invalid_package(msg: impl Into<String>) -> Self {
        Self::InvalidPackageName(msg.into())
    }

    /// Process exit status for this error.
    ///
    /// Command failures propagate the child's own status so that callers
    /// see the same code `apt-get` would have returned.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InsufficientPrivilege { .. } => EXIT_INSUFFICIENT_PRIVILEGE,
            Self::IndexRefresh(cmd) | Self::Install(cmd) => cmd.exit_code(),
            Self::InvalidPackageName(_) | Self::Transition(_) | Self::Io(_) | Self::Json(_) => {
                EXIT_GENERAL
            }
        }
    }
}

/// How a package manager invocation failed.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be started at all
    #[error("failed to launch {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited with a non-zero status
    #[error("`{command}` exited with status {code}")]
    Exited { command: String, code: i32 },

    /// The program was terminated by a signal
    #[error("`{command}` was killed by {}", signal_name(*.signal))]
    Signaled { command: String, signal: i32 },
}

impl CommandError {
    /// Create a spawn failure
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Exit status to propagate for this failure, never 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Spawn { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => EXIT_COMMAND_NOT_FOUND,
                _ => EXIT_COMMAND_NOT_EXECUTABLE,
            },
            Self::Exited { code, .. } => u8::try_from(*code)
                .ok()
                .filter(|c| *c != 0)
                .unwrap_or(EXIT_GENERAL),
            Self::Signaled { signal, .. } => signal
                .checked_add(128)
                .and_then(|c| u8::try_from(c).ok())
                .unwrap_or(EXIT_GENERAL),
        }
    }
}

/// `SIGTERM` instead of `15` when the number is a known signal.
fn signal_name(signal: i32) -> String {
    match Signal::try_from(signal) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("signal {}", signal),
    }
}
