//! CLI integration tests for the vpnmgr binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn vpnmgr() -> Command {
    Command::cargo_bin("vpnmgr").expect("vpnmgr binary should build")
}

#[test]
fn test_help_lists_options() {
    vpnmgr()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--profile"))
        .stdout(predicate::str::contains("--duration"));
}

#[test]
fn test_profile_is_required() {
    vpnmgr()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--profile"));
}

#[test]
fn test_missing_profile_file_fails() {
    vpnmgr()
        .args(["--profile", "/nonexistent/profile.json", "--duration", "1"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_profile_content_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{\"profile_name\": \"no-tunnel-blob\"}}").unwrap();

    vpnmgr()
        .arg("--profile")
        .arg(file.path())
        .args(["--duration", "1"])
        .assert()
        .failure();
}

#[test]
fn test_session_runs_from_profile_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "{{\"profile_name\": \"cli-test\", \"tunnel_config\": \"remote vpn.test 1194\"}}"
    )
    .unwrap();

    vpnmgr()
        .arg("--profile")
        .arg(file.path())
        .args(["--duration", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Connected"))
        .stdout(predicate::str::contains("vpnmgr stopped"));
}
