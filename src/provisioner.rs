//! Provisioner
//!
//! Runs the four provisioning steps in order and stops at the first
//! failure:
//!
//! 1. privilege check (before anything touches the system)
//! 2. `apt-get update`
//! 3. `apt-get install` of the fixed package list
//! 4. confirmation on stdout
//!
//! Nothing is retried and nothing is rolled back. Packages installed before
//! a later failure stay installed; rerunning is safe because apt skips
//! packages that are already present.

use crate::config::{ENV_SKIP_ROOT_CHECK, ProvisionConfig};
use crate::error::{ProvisionError, Result};
use crate::package_manager::{AptGet, PackageManager};
use crate::packages::PackageRequest;
use crate::provision_state::{ProvisionContext, ProvisionStage};
use crate::report::ProvisionReport;
use crate::sanity::{EffectiveUid, PrivilegeProbe};
use std::io::Write;
use tracing::{debug, info, warn};

/// Runs one provisioning pass against a package manager and privilege probe.
pub struct Provisioner<M, P> {
    package_manager: M,
    probe: P,
    request: PackageRequest,
    config: ProvisionConfig,
    context: ProvisionContext,
}

impl<M: PackageManager, P: PrivilegeProbe> Provisioner<M, P> {
    /// Create a provisioner for the required package list.
    pub fn new(package_manager: M, probe: P, config: ProvisionConfig) -> Self {
        Self {
            package_manager,
            probe,
            request: PackageRequest::required(),
            config,
            context: ProvisionContext::new(),
        }
    }

    /// Replace the package list.
    pub fn with_request(mut self, request: PackageRequest) -> Self {
        self.request = request;
        self
    }

    pub fn context(&self) -> &ProvisionContext {
        &self.context
    }

    pub fn package_manager(&self) -> &M {
        &self.package_manager
    }

    /// Run every step, writing the confirmation to `out`.
    ///
    /// On error the context is left in `Failed` and nothing has been
    /// written to `out`.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<ProvisionReport> {
        let result = self.run_steps(out);

        if let Err(e) = &result {
            debug!("Provisioning aborted at '{}': {}", self.context.current_stage(), e);
            if !self.context.current_stage().is_terminal() {
                self.context.fail()?;
            }
        }

        result
    }

    fn run_steps<W: Write>(&mut self, out: &mut W) -> Result<ProvisionReport> {
        self.check_privileges()?;
        self.request.validate()?;

        info!("Refreshing package index");
        self.package_manager
            .refresh_index()
            .map_err(ProvisionError::IndexRefresh)?;
        self.context.transition_to(ProvisionStage::IndexRefreshed)?;

        info!("Installing packages: {}", self.request);
        self.package_manager
            .install(&self.request)
            .map_err(ProvisionError::Install)?;
        self.context
            .transition_to(ProvisionStage::PackagesInstalled)?;

        let report = self.build_report();
        report.write(out, self.config.output)?;
        self.context.transition_to(ProvisionStage::Reported)?;

        Ok(report)
    }

    fn check_privileges(&mut self) -> Result<()> {
        let euid = self.probe.effective_uid();

        if euid == 0 {
            debug!("Running as root");
        } else if self.config.skip_root_check {
            warn!(
                "Root check skipped ({}=1), effective uid is {}",
                ENV_SKIP_ROOT_CHECK, euid
            );
        } else if self.config.dry_run {
            warn!(
                "Not running as root (effective uid {}); continuing because this is a dry run",
                euid
            );
        } else {
            info!("Refusing to run without root privileges (effective uid {})", euid);
            return Err(ProvisionError::InsufficientPrivilege { euid });
        }

        self.context
            .transition_to(ProvisionStage::PrivilegeChecked)?;
        Ok(())
    }

    fn build_report(&self) -> ProvisionReport {
        let sshd_config = self.config.sshd_config.clone();
        let sshd_config_present = sshd_config.is_file();

        if sshd_config_present {
            info!("Found {}", sshd_config.display());
        } else {
            info!(
                "{} not found; openssh-server may not have created its configuration",
                sshd_config.display()
            );
        }

        ProvisionReport {
            packages: self.request.names().iter().map(|n| (*n).to_string()).collect(),
            dry_run: self.config.dry_run,
            commands: self.package_manager.commands().to_vec(),
            stages: self.context.history().to_vec(),
            sshd_config,
            sshd_config_present,
        }
    }
}

/// Provision the host with `apt-get` and the real effective uid, writing
/// the confirmation to stdout.
pub fn provision(config: &ProvisionConfig) -> Result<ProvisionReport> {
    let apt = AptGet::new(config.apt_get.clone()).dry_run(config.dry_run);
    let mut provisioner = Provisioner::new(apt, EffectiveUid, config.clone());

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    provisioner.run(&mut handle)
}
