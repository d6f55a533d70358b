//! Confirmation output written to stdout once provisioning succeeds.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::package_manager::PlannedCommand;
use crate::provision_state::ProvisionStage;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// Requested package names, in install order
    pub packages: Vec<String>,
    pub dry_run: bool,
    /// Package manager commands that ran (or would have run)
    pub commands: Vec<PlannedCommand>,
    /// Stages passed through before the report was written
    pub stages: Vec<ProvisionStage>,
    pub sshd_config: PathBuf,
    pub sshd_config_present: bool,
}

impl ProvisionReport {
    /// The one-line confirmation for a real run.
    pub fn success_message(&self) -> String {
        format!("Successfully installed: {}", self.packages.join(" "))
    }

    pub fn write<W: Write>(&self, out: &mut W, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => self.write_text(out)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, &JsonReport::from(self))?;
                writeln!(out)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    fn write_text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if !self.dry_run {
            return writeln!(out, "{}", self.success_message());
        }

        writeln!(out, "Dry run, no changes made. Would run:")?;
        for command in &self.commands {
            writeln!(out, "  {}", command)?;
        }
        writeln!(out, "Would install: {}", self.packages.join(" "))
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    status: &'static str,
    #[serde(flatten)]
    report: &'a ProvisionReport,
}

impl<'a> From<&'a ProvisionReport> for JsonReport<'a> {
    fn from(report: &'a ProvisionReport) -> Self {
        Self {
            status: if report.dry_run { "planned" } else { "success" },
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dry_run: bool) -> ProvisionReport {
        ProvisionReport {
            packages: vec![
                "openssh-server".to_string(),
                "python3".to_string(),
                "python3-tk".to_string(),
            ],
            dry_run,
            commands: vec![
                PlannedCommand {
                    program: "apt-get".to_string(),
                    args: vec!["update".to_string(), "-qq".to_string()],
                },
                PlannedCommand {
                    program: "apt-get".to_string(),
                    args: vec![
                        "install".to_string(),
                        "-y".to_string(),
                        "openssh-server".to_string(),
                        "python3".to_string(),
                        "python3-tk".to_string(),
                    ],
                },
            ],
            stages: vec![
                ProvisionStage::PrivilegeChecked,
                ProvisionStage::IndexRefreshed,
                ProvisionStage::PackagesInstalled,
            ],
            sshd_config: PathBuf::from("/etc/ssh/sshd_config"),
            sshd_config_present: true,
        }
    }

    #[test]
    fn test_text_report_exact_line() {
        let mut out = Vec::new();
        sample(false).write(&mut out, OutputFormat::Text).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Successfully installed: openssh-server python3 python3-tk\n"
        );
    }

    #[test]
    fn test_dry_run_text_lists_commands() {
        let mut out = Vec::new();
        sample(true).write(&mut out, OutputFormat::Text).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Dry run, no changes made."));
        assert!(text.contains("  apt-get update -qq\n"));
        assert!(text.contains("  apt-get install -y openssh-server python3 python3-tk\n"));
        assert!(!text.contains("Successfully installed"));
    }

    #[test]
    fn test_json_report_fields() {
        let mut out = Vec::new();
        sample(false).write(&mut out, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["packages"][2], "python3-tk");
        assert_eq!(value["commands"][0]["args"][0], "update");
        assert_eq!(value["stages"][1], "index_refreshed");
        assert_eq!(value["sshd_config_present"], true);
    }

    #[test]
    fn test_json_dry_run_status() {
        let mut out = Vec::new();
        sample(true).write(&mut out, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "planned");
        assert_eq!(value["dry_run"], true);
    }
}
