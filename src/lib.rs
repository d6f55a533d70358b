//! sshd-prep Library
//!
//! Prepares a Debian-family host for the sshd configurator: checks for root,
//! refreshes the apt index, installs the required packages and reports.

pub mod cli;
pub mod config;
pub mod error;
pub mod package_manager;
pub mod packages;
pub mod provision_state;
pub mod provisioner;
pub mod report;
pub mod sanity;

// Re-export main types for convenience
pub use config::{OutputFormat, ProvisionConfig};
pub use error::{CommandError, ProvisionError};
pub use package_manager::{AptGet, PackageManager, PlannedCommand};
pub use packages::{PackageRequest, REQUIRED_PACKAGES};
pub use provision_state::{ProvisionContext, ProvisionStage, TransitionError};
pub use provisioner::{Provisioner, provision};
pub use report::ProvisionReport;
pub use sanity::{EffectiveUid, FixedUid, PrivilegeProbe};
