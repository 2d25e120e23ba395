//! Drive the attestd binary in a subprocess against a throwaway home
//! directory, the way an operator would from a shell.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempdir::TempDir;

const NONCE: &str = "5f1c9a7e2b3d4c6f8091a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f7";
const OTHER_NONCE: &str = "a0a1a2a3a4a5a6a7a8a9aaabacadaeafb0b1b2b3b4b5b6b7b8b9babbbcbdbebf";

fn attestd(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_attestd"))
        .arg("--home")
        .arg(home)
        .args(args)
        .env("RUST_LOG", "attestd=debug")
        .output()
        .expect("failed to run attestd")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn initialized() -> TempDir {
    let home = TempDir::new("attestd").expect("failed to create temp home");

    let out = attestd(home.path(), &["init"]);
    assert!(out.status.success(), "init failed:\n{}", stderr(&out));

    home
}

#[test]
fn test_attest_then_verify() {
    let home = initialized();

    let out = attestd(home.path(), &["measure", "--pcr", "8", "--data", "vmlinuz-6.1"]);
    assert!(out.status.success(), "measure failed:\n{}", stderr(&out));
    assert_eq!(stdout(&out).len(), 64, "prints the new sha256 PCR value");

    let out = attestd(home.path(), &["attest", "--nonce", NONCE]);
    assert!(out.status.success(), "attest failed:\n{}", stderr(&out));
    let evidence = stdout(&out);

    let out = attestd(
        home.path(),
        &["verify", "--evidence", &evidence, "--nonce", NONCE],
    );
    assert!(out.status.success(), "verify failed:\n{}", stderr(&out));

    let result: Value = serde_json::from_str(&stdout(&out)).expect("verify prints JSON");
    for flag in [
        "quoteVerified",
        "nonceVerified",
        "pcrsVerified",
        "eventLogVerified",
        "policyVerified",
    ] {
        assert_eq!(result[flag], Value::Bool(true), "{flag} in {result}");
    }
}

#[test]
fn test_verify_rejects_other_nonce() {
    let home = initialized();

    let out = attestd(home.path(), &["attest", "--nonce", NONCE, "--mtu", "185"]);
    assert!(out.status.success(), "attest failed:\n{}", stderr(&out));
    let evidence = stdout(&out);

    let out = attestd(
        home.path(),
        &["verify", "--evidence", &evidence, "--nonce", OTHER_NONCE],
    );
    assert!(!out.status.success(), "stale evidence must not verify");

    let result: Value = serde_json::from_str(&stdout(&out)).expect("verify prints JSON");
    assert_eq!(result["quoteVerified"], Value::Bool(true), "{result}");
    assert_eq!(result["nonceVerified"], Value::Bool(false), "{result}");
}

#[test]
fn test_init_refuses_to_overwrite() {
    let home = initialized();

    let out = attestd(home.path(), &["init"]);
    assert!(!out.status.success(), "second init must fail");
    assert!(
        stderr(&out).contains("already initialized"),
        "stderr:\n{}",
        stderr(&out)
    );

    let out = attestd(home.path(), &["init", "--force", "--bank", "sha384"]);
    assert!(out.status.success(), "forced init failed:\n{}", stderr(&out));
}

#[test]
fn test_uninitialized_home() {
    let home = TempDir::new("attestd").expect("failed to create temp home");

    let out = attestd(home.path(), &["attest", "--nonce", NONCE]);

    assert!(!out.status.success(), "attest needs a configured device");
    assert!(
        stderr(&out).contains("not initialized"),
        "stderr:\n{}",
        stderr(&out)
    );
}

#[test]
fn test_info_reports_identity() {
    let home = initialized();

    let out = attestd(home.path(), &["info", "--all"]);
    assert!(out.status.success(), "info failed:\n{}", stderr(&out));

    let info: Value = serde_json::from_str(&stdout(&out)).expect("info prints JSON");

    assert_eq!(
        info["characteristic"],
        Value::String("7c3e1a52-9b4d-4f6e-a1c2-5d8e9f0a3b71".to_owned())
    );
    assert_eq!(info["bank"], Value::String("sha256".to_owned()));
    assert_eq!(info["pcrs"].as_array().map(Vec::len), Some(24));
    assert_eq!(info["events"], Value::from(0));
}

#[test]
fn test_init_rejects_duplicate_selection() {
    let home = TempDir::new("attestd").expect("failed to create temp home");

    let out = attestd(home.path(), &["init", "--pcrs", "8,8"]);
    assert!(!out.status.success(), "PCR 8 selected twice");
    assert!(
        !home.path().join("config.toml").exists(),
        "nothing is written for a rejected selection"
    );
}
