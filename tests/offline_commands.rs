//! Integration tests for the subcommands that never touch the network.

use std::process::Command;
use tempfile::TempDir;

fn geofill() -> Command {
    Command::new(env!("CARGO_BIN_EXE_geofill"))
}

#[test]
fn check_rejects_missing_required_columns() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("facilities.csv");
    std::fs::write(&input, "施設名,緯度,経度\nA,35.0,139.0\n").expect("write input");
    let ledger = dir.path().join("usage.json");

    let output = geofill()
        .args(["check", "--input"])
        .arg(&input)
        .arg("--ledger")
        .arg(&ledger)
        .output()
        .expect("run geofill");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("住所"), "stderr: {stderr}");
    assert!(!ledger.exists(), "check must not create the ledger");
}

#[test]
fn check_reports_pending_rows_and_quota() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("facilities.csv");
    std::fs::write(&input, "施設名,住所,緯度,経度\nA,X,,\nB,Y,35.0,139.0\n")
        .expect("write input");
    let ledger = dir.path().join("usage.json");

    let output = geofill()
        .args(["check", "--input"])
        .arg(&input)
        .arg("--ledger")
        .arg(&ledger)
        .output()
        .expect("run geofill");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 of 2 rows"), "stdout: {stdout}");
    assert!(stdout.contains("10000"), "stdout: {stdout}");
}

#[test]
fn usage_emits_current_month_json() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = dir.path().join("usage.json");
    let month = chrono::Local::now().format("%Y-%m").to_string();
    std::fs::write(&ledger, format!(r#"{{"{month}": 7}}"#)).expect("seed ledger");

    let output = geofill()
        .arg("usage")
        .arg("--ledger")
        .arg(&ledger)
        .arg("--json")
        .output()
        .expect("run geofill");

    assert!(output.status.success(), "{output:?}");
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse usage JSON");
    assert_eq!(parsed["month"], month.as_str());
    assert_eq!(parsed["total"], 7);
    assert_eq!(parsed["remaining"], 9_993);
}

#[test]
fn init_config_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("geofill.json");

    let first = geofill()
        .args(["init-config", "--out"])
        .arg(&config)
        .output()
        .expect("run geofill");
    assert!(first.status.success(), "{first:?}");
    let stub: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config).expect("read stub"))
            .expect("parse stub");
    assert_eq!(stub["schema_version"], 1);

    let second = geofill()
        .args(["init-config", "--out"])
        .arg(&config)
        .output()
        .expect("run geofill");
    assert!(!second.status.success());

    let forced = geofill()
        .args(["init-config", "--out"])
        .arg(&config)
        .arg("--force")
        .output()
        .expect("run geofill");
    assert!(forced.status.success(), "{forced:?}");
}

#[test]
fn run_requires_an_api_key() {
    let dir = TempDir::new().expect("temp dir");
    let input = dir.path().join("facilities.csv");
    std::fs::write(&input, "施設名,住所,緯度,経度\nA,X,,\n").expect("write input");

    let output = geofill()
        .args(["run", "--input"])
        .arg(&input)
        .env_remove("GEOFILL_API_KEY")
        .output()
        .expect("run geofill");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GEOFILL_API_KEY"), "stderr: {stderr}");
}
