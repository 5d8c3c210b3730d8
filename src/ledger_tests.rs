use super::{month_key, UsageLedger, MONTHLY_QUOTA_CAP};
use chrono::Local;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn ledger_in(dir: &TempDir) -> UsageLedger {
    UsageLedger::new(dir.path().join("api_usage_log.json"))
}

fn stored_map(ledger: &UsageLedger) -> BTreeMap<String, u64> {
    let bytes = std::fs::read(ledger.path()).expect("read ledger file");
    serde_json::from_slice(&bytes).expect("parse ledger file")
}

#[test]
fn records_into_missing_storage() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    let totals = ledger
        .record_usage_for_month("2024-05", 3)
        .expect("record usage");
    assert_eq!(totals.month, "2024-05");
    assert_eq!(totals.total, 3);
    assert_eq!(totals.remaining, 9_997);
    assert_eq!(stored_map(&ledger).get("2024-05"), Some(&3));
}

#[test]
fn adds_to_existing_month() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    std::fs::write(ledger.path(), r#"{"2024-05": 7}"#).expect("seed ledger");
    let totals = ledger
        .record_usage_for_month("2024-05", 3)
        .expect("record usage");
    assert_eq!(totals.total, 10);
    assert_eq!(totals.remaining, 9_990);
    assert_eq!(stored_map(&ledger).get("2024-05"), Some(&10));
}

#[test]
fn split_recording_matches_single_recording() {
    let dir = TempDir::new().expect("temp dir");
    let split = ledger_in(&dir);
    split.record_usage_for_month("2024-05", 4).expect("record");
    let split_totals = split.record_usage_for_month("2024-05", 6).expect("record");

    let other = TempDir::new().expect("temp dir");
    let single = ledger_in(&other);
    let single_totals = single
        .record_usage_for_month("2024-05", 10)
        .expect("record");

    assert_eq!(split_totals, single_totals);
}

#[test]
fn corrupt_storage_counts_as_zero_prior_usage() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    std::fs::write(ledger.path(), "not json at all").expect("seed ledger");
    let totals = ledger
        .record_usage_for_month("2024-05", 4)
        .expect("record usage");
    assert_eq!(totals.total, 4);
    assert_eq!(totals.remaining, MONTHLY_QUOTA_CAP as i64 - 4);
}

#[test]
fn other_months_survive_an_update() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    std::fs::write(ledger.path(), r#"{"2024-04": 12}"#).expect("seed ledger");
    ledger
        .record_usage_for_month("2024-05", 1)
        .expect("record usage");
    let stored = stored_map(&ledger);
    assert_eq!(stored.get("2024-04"), Some(&12));
    assert_eq!(stored.get("2024-05"), Some(&1));
}

#[test]
fn zero_calls_still_persists_the_month() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    let totals = ledger
        .record_usage_for_month("2024-05", 0)
        .expect("record usage");
    assert_eq!(totals.total, 0);
    assert_eq!(stored_map(&ledger).get("2024-05"), Some(&0));
}

#[test]
fn remaining_goes_negative_past_the_cap() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    std::fs::write(ledger.path(), r#"{"2024-05": 9999}"#).expect("seed ledger");
    let totals = ledger
        .record_usage_for_month("2024-05", 5)
        .expect("record usage");
    assert_eq!(totals.total, 10_004);
    assert_eq!(totals.remaining, -4);
}

#[test]
fn record_usage_uses_the_current_local_month() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    let totals = ledger.record_usage(2).expect("record usage");
    assert_eq!(totals.month, month_key(Local::now()));
    assert_eq!(totals.total, 2);
}

#[test]
fn current_usage_reads_without_writing() {
    let dir = TempDir::new().expect("temp dir");
    let ledger = ledger_in(&dir);
    let totals = ledger.current_usage();
    assert_eq!(totals.total, 0);
    assert_eq!(totals.remaining, MONTHLY_QUOTA_CAP as i64);
    assert!(!ledger.path().exists());
}
