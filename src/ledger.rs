//! Monthly API usage ledger persisted as JSON.
//!
//! The ledger maps `"YYYY-MM"` month keys to cumulative call counts and is
//! shared across runs through a single file. It is constructed with an
//! injected storage path so tests (and alternate deployments) point it at a
//! temp file instead of the default data directory. Reads that fail for any
//! reason fall back to an empty mapping: the ledger prefers availability
//! over strict accounting and only a failed write is an error.
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Fixed monthly call allotment; reported only, never enforced.
pub const MONTHLY_QUOTA_CAP: u64 = 10_000;

type UsageMap = BTreeMap<String, u64>;

/// Cumulative usage for one month, with the remaining allotment.
///
/// `remaining` is a display value and goes negative once usage exceeds the
/// cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageTotals {
    pub month: String,
    pub total: u64,
    pub remaining: i64,
}

/// Persisted per-month call counter.
pub struct UsageLedger {
    path: PathBuf,
}

impl UsageLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Return the ledger's storage path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add this run's calls to the current month and persist the mapping.
    ///
    /// The month key is taken from local time at the moment of the call.
    /// `calls_this_run = 0` still performs the load-modify-store cycle.
    pub fn record_usage(&self, calls_this_run: u64) -> Result<UsageTotals> {
        self.record_usage_for_month(&month_key(Local::now()), calls_this_run)
    }

    pub(crate) fn record_usage_for_month(
        &self,
        month: &str,
        calls_this_run: u64,
    ) -> Result<UsageTotals> {
        let mut usage = self.load();
        let entry = usage.entry(month.to_string()).or_insert(0);
        *entry += calls_this_run;
        let total = *entry;
        self.store(&usage)?;
        Ok(totals(month, total))
    }

    /// Read-only view of the current month's usage; never touches storage
    /// beyond the load.
    pub fn current_usage(&self) -> UsageTotals {
        let month = month_key(Local::now());
        let total = self.load().get(&month).copied().unwrap_or(0);
        totals(&month, total)
    }

    /// Load the persisted mapping, treating any read failure as zero prior
    /// usage.
    fn load(&self) -> UsageMap {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return UsageMap::new(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "usage ledger unreadable, assuming zero prior usage");
                return UsageMap::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(usage) => usage,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "usage ledger corrupt, assuming zero prior usage");
                UsageMap::new()
            }
        }
    }

    /// Overwrite the persisted mapping in full.
    fn store(&self, usage: &UsageMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create ledger dir {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(usage).context("serialize usage ledger")?;
        fs::write(&self.path, text.as_bytes())
            .with_context(|| format!("write usage ledger {}", self.path.display()))?;
        Ok(())
    }
}

fn totals(month: &str, total: u64) -> UsageTotals {
    UsageTotals {
        month: month.to_string(),
        total,
        remaining: MONTHLY_QUOTA_CAP as i64 - total as i64,
    }
}

/// Calendar month key, e.g. `2024-05`.
pub fn month_key(now: DateTime<Local>) -> String {
    now.format("%Y-%m").to_string()
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
