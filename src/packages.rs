//! The fixed set of system packages the sshd configurator depends on.
//!
//! The list is compiled in and cannot be changed from the command line or
//! the environment. Names are checked against the Debian package name
//! grammar before anything is handed to the package manager; whether a
//! well-formed name actually exists in the configured repositories is left
//! for the package manager to decide.

use crate::error::{ProvisionError, Result};
use std::fmt;

/// Packages required by the sshd configurator, in install order.
///
/// - `openssh-server`: the SSH daemon being configured
/// - `python3`: runtime for the configurator
/// - `python3-tk`: GUI toolkit binding used by the configurator window
pub const REQUIRED_PACKAGES: &[&str] = &["openssh-server", "python3", "python3-tk"];

/// An ordered, non-empty list of package names to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageRequest {
    names: &'static [&'static str],
}

impl Default for PackageRequest {
    fn default() -> Self {
        Self::required()
    }
}

impl PackageRequest {
    /// The request used in production.
    pub const fn required() -> Self {
        Self {
            names: REQUIRED_PACKAGES,
        }
    }

    /// Build a request from an arbitrary static list.
    ///
    /// Used by tests that need a request the grammar rejects.
    pub const fn from_static(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[&'static str] {
        self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Check that the request is non-empty and every name is well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.names.is_empty() {
            return Err(ProvisionError::invalid_package("package request is empty"));
        }

        for name in self.names {
            if !is_valid_package_name(name) {
                return Err(ProvisionError::invalid_package(format!(
                    "'{}' is not a valid Debian package name",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for PackageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(" "))
    }
}

/// Debian policy 5.6.1: at least two characters, lowercase letters, digits,
/// `+`, `-` and `.`, starting with an alphanumeric.
///
/// Rejecting anything else also keeps shell metacharacters and option-like
/// strings (`-o...`) away from the package manager's argument list.
pub fn is_valid_package_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return false,
    }

    name.len() >= 2
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
}
