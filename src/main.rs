//! sshd-prep - Main entry point
//!
//! Installs the system packages the sshd configurator depends on.

use anyhow::Context;
use sshd_prep::cli::Cli;
use sshd_prep::config::ProvisionConfig;
use sshd_prep::error::{EXIT_GENERAL, ProvisionError};
use sshd_prep::{provision, sanity};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Initialize the logger; `RUST_LOG` overrides the verbosity flags
fn init_logger(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = ProvisionConfig::from_cli(cli);
    debug!("Configuration: {:?}", config);

    let report = provision(&config).context("Provisioning failed")?;
    info!(
        "Provisioning complete: {} package(s){}",
        report.packages.len(),
        if report.dry_run { " (dry run)" } else { "" }
    );

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logger(cli.default_log_level());
    info!("sshd-prep {} starting", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let provision_err = err.downcast_ref::<ProvisionError>();

            // The privilege hint is the only diagnostic printed directly;
            // apt-get has already written its own errors to stderr.
            match provision_err {
                Some(ProvisionError::InsufficientPrivilege { euid }) => {
                    sanity::print_privilege_error(*euid)
                }
                _ => error!("{:#}", err),
            }

            ExitCode::from(provision_err.map_or(EXIT_GENERAL, ProvisionError::exit_code))
        }
    }
}
