//! End-to-end tests for the sshd-prep binary
//!
//! The binary is pointed at a fake `apt-get` shell script that appends its
//! arguments to a log file and exits with a status taken from the
//! environment, so no real package is ever installed.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;
use tempfile::TempDir;

const FAKE_APT_GET: &str = r#"#!/bin/sh
echo "$DEBIAN_FRONTEND $*" >> "$FAKE_APT_LOG"
case "$1" in
    update) exit "${FAKE_APT_UPDATE_EXIT:-0}" ;;
    install) exit "${FAKE_APT_INSTALL_EXIT:-0}" ;;
esac
exit 0
"#;

/// uid/gid of `nobody`, used to run the binary unprivileged from a root test process
const NOBODY: u32 = 65534;

const EXPECTED_MESSAGE: &str = "Successfully installed: openssh-server python3 python3-tk\n";

/// Directory holding the shared fake apt-get, written once per test binary.
fn fake_apt_get() -> &'static Path {
    static DIR: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = DIR.get_or_init(|| {
        let dir = TempDir::new().expect("Should create temp dir");
        let path = dir.path().join("apt-get");
        fs::write(&path, FAKE_APT_GET).expect("Should write fake apt-get");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Should make fake apt-get executable");
        (dir, path)
    });
    path
}

/// One isolated run: its own log file and sshd_config location.
struct Harness {
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Should create temp dir"),
        }
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("apt.log")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sshd-prep"));
        cmd.env_remove("RUST_LOG")
            .env("SSHD_PREP_APT_GET", fake_apt_get())
            .env("SSHD_PREP_SKIP_ROOT_CHECK", "1")
            .env("SSHD_PREP_SSHD_CONFIG", self.dir.path().join("sshd_config"))
            .env("FAKE_APT_LOG", self.log_path());
        cmd
    }

    /// Command that runs without root, even when the tests themselves run as root.
    ///
    /// The binary is copied into a world-readable directory because the
    /// build tree may not be reachable by `nobody`.
    fn unprivileged_command(&self) -> Command {
        if !nix::unistd::geteuid().is_root() {
            return self.command();
        }

        let bin_dir = self.dir.path().join("bin");
        fs::create_dir(&bin_dir).expect("Should create bin dir");
        for dir in [self.dir.path(), bin_dir.as_path()] {
            fs::set_permissions(dir, fs::Permissions::from_mode(0o755))
                .expect("Should open up temp dir permissions");
        }

        let binary = bin_dir.join("sshd-prep");
        fs::copy(env!("CARGO_BIN_EXE_sshd-prep"), &binary).expect("Should copy binary");
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
            .expect("Should make binary executable");

        let mut cmd = Command::new(&binary);
        cmd.env_remove("RUST_LOG")
            .env("SSHD_PREP_APT_GET", fake_apt_get())
            .env("FAKE_APT_LOG", self.log_path())
            .current_dir(&bin_dir)
            .uid(NOBODY)
            .gid(NOBODY);
        cmd
    }

    fn run(&self, configure: impl FnOnce(&mut Command)) -> Output {
        let mut cmd = self.command();
        configure(&mut cmd);
        cmd.output().expect("Should run sshd-prep")
    }

    fn apt_calls(&self) -> Vec<String> {
        match fs::read_to_string(self.log_path()) {
            Ok(log) => log.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_success_prints_exact_message() {
    let harness = Harness::new();
    let output = harness.run(|_| {});

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), EXPECTED_MESSAGE);
    assert_eq!(
        harness.apt_calls(),
        vec![
            "noninteractive update -qq",
            "noninteractive install -y openssh-server python3 python3-tk",
        ]
    );
}

#[test]
fn test_second_run_matches_first() {
    let harness = Harness::new();
    let first = harness.run(|_| {});
    let second = harness.run(|_| {});

    assert_eq!(first.status.code(), Some(0));
    assert_eq!(second.status.code(), Some(0));
    assert_eq!(stdout(&first), stdout(&second));
    assert_eq!(harness.apt_calls().len(), 4);
}

#[test]
fn test_update_failure_propagates_and_skips_install() {
    let harness = Harness::new();
    let output = harness.run(|cmd| {
        cmd.env("FAKE_APT_UPDATE_EXIT", "100");
    });

    assert_eq!(output.status.code(), Some(100));
    assert!(stdout(&output).is_empty());
    assert_eq!(harness.apt_calls(), vec!["noninteractive update -qq"]);
}

#[test]
fn test_failure_diagnostic_is_plain_and_not_repeated() {
    let harness = Harness::new();
    let output = harness.run(|cmd| {
        cmd.env("FAKE_APT_UPDATE_EXIT", "1");
    });

    let err = stderr(&output);
    assert_eq!(output.status.code(), Some(1));
    assert!(err.contains("Package index refresh failed"), "stderr: {}", err);
    assert_eq!(err.matches("update -qq` exited with status 1").count(), 1, "stderr: {}", err);
    assert!(!err.contains('\u{1b}'), "captured stderr should carry no color codes: {:?}", err);
}

#[test]
fn test_install_failure_prints_no_confirmation() {
    let harness = Harness::new();
    let output = harness.run(|cmd| {
        cmd.env("FAKE_APT_INSTALL_EXIT", "42");
    });

    assert_eq!(output.status.code(), Some(42));
    assert!(!stdout(&output).contains("Successfully installed"));
    assert_eq!(harness.apt_calls().len(), 2);
}

#[test]
fn test_non_root_is_refused() {
    let harness = Harness::new();
    let output = harness
        .unprivileged_command()
        .env_remove("SSHD_PREP_SKIP_ROOT_CHECK")
        .output()
        .expect("Should run sshd-prep");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Please run with sudo or as root"));
    assert!(stdout(&output).is_empty());
    assert!(harness.apt_calls().is_empty(), "apt-get must not be invoked");
}

#[test]
fn test_dry_run_does_not_invoke_apt() {
    let harness = Harness::new();
    let output = harness.run(|cmd| {
        cmd.arg("--dry-run");
    });

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("update -qq"));
    assert!(text.contains("install -y openssh-server python3 python3-tk"));
    assert!(harness.apt_calls().is_empty());
}

#[test]
fn test_missing_package_manager_exits_127() {
    let harness = Harness::new();
    let output = harness.run(|cmd| {
        cmd.env("SSHD_PREP_APT_GET", "this_binary_definitely_does_not_exist_12345");
    });

    assert_eq!(output.status.code(), Some(127));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_json_report() {
    let harness = Harness::new();
    fs::write(harness.dir.path().join("sshd_config"), "Port 22\n").unwrap();

    let output = harness.run(|cmd| {
        cmd.args(["--format", "json"]);
    });

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["sshd_config_present"], true);
    assert_eq!(value["commands"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_rejects_extra_arguments() {
    let harness = Harness::new();
    let output = harness.run(|cmd| {
        cmd.arg("vim");
    });

    assert_eq!(output.status.code(), Some(2));
    assert!(harness.apt_calls().is_empty());
}
