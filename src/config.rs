//! Runtime configuration
//!
//! Combines command line flags with a small set of environment variables.
//! The package list is deliberately absent: it is fixed in `packages`.

use crate::cli::Cli;
use std::path::PathBuf;
use strum::{Display, EnumString};

/// Program used to refresh the index and install packages
pub const DEFAULT_APT_GET: &str = "apt-get";

/// File whose presence is checked once `openssh-server` is installed
pub const DEFAULT_SSHD_CONFIG: &str = "/etc/ssh/sshd_config";

pub const ENV_APT_GET: &str = "SSHD_PREP_APT_GET";
pub const ENV_SKIP_ROOT_CHECK: &str = "SSHD_PREP_SKIP_ROOT_CHECK";
pub const ENV_SSHD_CONFIG: &str = "SSHD_PREP_SSHD_CONFIG";

/// How the confirmation is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Display, EnumString, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything a provisioning run needs to know besides the package list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Package manager program (name on PATH or absolute path)
    pub apt_get: PathBuf,
    /// Bypass the effective-uid check (development only)
    pub skip_root_check: bool,
    /// Record commands instead of running them
    pub dry_run: bool,
    pub output: OutputFormat,
    pub sshd_config: PathBuf,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            apt_get: PathBuf::from(DEFAULT_APT_GET),
            skip_root_check: false,
            dry_run: false,
            output: OutputFormat::Text,
            sshd_config: PathBuf::from(DEFAULT_SSHD_CONFIG),
        }
    }
}

impl ProvisionConfig {
    /// Build the configuration from parsed flags and the process environment.
    pub fn from_cli(cli: &Cli) -> Self {
        Self::from_lookup(cli, |key| std::env::var(key).ok())
    }

    /// Build the configuration from parsed flags and an environment lookup.
    pub fn from_lookup<F>(cli: &Cli, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            dry_run: cli.dry_run,
            output: cli.format,
            ..Self::default()
        };

        if let Some(program) = lookup(ENV_APT_GET).filter(|v| !v.trim().is_empty()) {
            config.apt_get = PathBuf::from(program);
        }

        if let Some(path) = lookup(ENV_SSHD_CONFIG).filter(|v| !v.trim().is_empty()) {
            config.sshd_config = PathBuf::from(path);
        }

        config.skip_root_check = lookup(ENV_SKIP_ROOT_CHECK)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        config
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
