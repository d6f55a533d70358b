//! Pre-flight privilege check
//!
//! Installing packages writes to the system package database, so the run
//! must happen with effective uid 0. The check runs before any package
//! manager command; on failure the program prints a remediation hint and
//! exits with status 1.

use std::io::{self, Write};

/// Source of the effective user id.
pub trait PrivilegeProbe {
    fn effective_uid(&self) -> u32;

    fn is_root(&self) -> bool {
        self.effective_uid() == 0
    }
}

/// Reads the real effective uid of this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct EffectiveUid;

impl PrivilegeProbe for EffectiveUid {
    fn effective_uid(&self) -> u32 {
        nix::unistd::geteuid().as_raw()
    }
}

/// Probe that reports a fixed uid.
#[derive(Debug, Clone, Copy)]
pub struct FixedUid(pub u32);

impl PrivilegeProbe for FixedUid {
    fn effective_uid(&self) -> u32 {
        self.0
    }
}

/// Write the insufficient-privilege diagnostic.
pub fn write_privilege_error<W: Write>(out: &mut W, euid: u32) -> io::Result<()> {
    writeln!(out, "ERROR: Root privileges required (effective uid is {})", euid)?;
    writeln!(
        out,
        "   Installing system packages needs write access to the package database."
    )?;
    writeln!(out)?;
    writeln!(out, "   Please run with sudo or as root:")?;
    writeln!(out, "     sudo sshd-prep")?;
    Ok(())
}

/// Print the insufficient-privilege diagnostic to stderr.
pub fn print_privilege_error(euid: u32) {
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    if let Err(e) = write_privilege_error(&mut handle, euid) {
        tracing::debug!("Could not write privilege diagnostic: {}", e);
    }
}
