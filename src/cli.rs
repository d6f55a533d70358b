use crate::config::OutputFormat;
use clap::{ArgAction, Parser};

/// sshd-prep - install the system packages the sshd configurator needs
///
/// Refreshes the apt package index and installs openssh-server, python3
/// and python3-tk. Must be run as root.
#[derive(Parser, Debug)]
#[command(name = "sshd-prep")]
#[command(about = "Install the system packages required by the sshd configurator")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show the apt-get commands without running them.
    ///
    /// The privilege check still runs, but failing it only logs a warning
    /// since nothing on the system is changed.
    #[arg(long)]
    pub dry_run: bool,

    /// Format of the confirmation written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
