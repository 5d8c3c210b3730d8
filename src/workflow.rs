//! Enrichment workflow and the command handlers built on it.
//!
//! The core loop walks the table in input order, looks up rows with a
//! missing coordinate, patches hits in place, and records the run's call
//! count in the usage ledger exactly once. Row-level failures never abort
//! the batch; only the upfront schema gate can. Command handlers wire the
//! loop to files, the HTTP client, and the ledger location.
use crate::cli::{CheckArgs, InitConfigArgs, RunArgs, UsageArgs};
use crate::config::{self, ColumnLabels};
use crate::geocode::{GeocodeClient, Geocoder};
use crate::ledger::{UsageLedger, UsageTotals, MONTHLY_QUOTA_CAP};
use crate::table::Table;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable consulted when `--api-key` is not given.
pub const API_KEY_ENV: &str = "GEOFILL_API_KEY";

/// Input table lacks one or more required columns.
///
/// Fatal to the run: raised before any lookup or ledger update.
#[derive(Debug, Error)]
#[error("input table is missing required columns: {}", .missing.join(" / "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

/// Resolved indices of the four required columns.
struct SchemaColumns {
    name: usize,
    address: usize,
    latitude: usize,
    longitude: usize,
}

/// Locate the required columns, collecting every missing label.
fn resolve_schema(table: &Table, labels: &ColumnLabels) -> Result<SchemaColumns, SchemaError> {
    let mut missing = Vec::new();
    let mut index = |label: &str| match table.column_index(label) {
        Some(index) => index,
        None => {
            missing.push(label.to_string());
            0
        }
    };
    let columns = SchemaColumns {
        name: index(&labels.name),
        address: index(&labels.address),
        latitude: index(&labels.latitude),
        longitude: index(&labels.longitude),
    };
    if missing.is_empty() {
        Ok(columns)
    } else {
        Err(SchemaError { missing })
    }
}

/// Result of one enrichment run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Search keys whose lookup resolved (row patched in place).
    pub successes: Vec<String>,
    /// Search keys whose lookup did not resolve (row left untouched).
    pub failures: Vec<String>,
    /// Lookups performed this run; skipped rows do not count.
    pub calls_this_run: u64,
    /// Monthly totals after recording, unless the ledger write failed.
    pub usage: Option<UsageTotals>,
    /// Warning from a failed ledger write; the enriched data is still valid.
    pub ledger_warning: Option<String>,
}

/// Enrich the table in place and record the run's calls in the ledger.
///
/// Rows with both coordinates present are skipped and never counted. The
/// derived search-key column is appended (or reused) and filled for every
/// row. The ledger is updated exactly once, after the last row.
pub fn run_enrichment(
    table: &mut Table,
    columns: &ColumnLabels,
    geocoder: &dyn Geocoder,
    ledger: &UsageLedger,
) -> Result<RunOutcome> {
    let schema = resolve_schema(table, columns)?;
    // A colliding search-key label would overwrite coordinates in place.
    let required = [
        &columns.name,
        &columns.address,
        &columns.latitude,
        &columns.longitude,
    ];
    if required.contains(&&columns.search_key) {
        bail!(
            "search key label {:?} collides with a required column",
            columns.search_key
        );
    }
    let search_column = table.ensure_column(&columns.search_key);

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    let mut calls_this_run: u64 = 0;

    for row in 0..table.row_count() {
        let key = format!(
            "{} {}",
            table.cell(row, schema.name),
            table.cell(row, schema.address)
        );
        table.set_cell(row, search_column, key.clone());

        let latitude_missing = table.cell(row, schema.latitude).trim().is_empty();
        let longitude_missing = table.cell(row, schema.longitude).trim().is_empty();
        if !latitude_missing && !longitude_missing {
            continue;
        }

        calls_this_run += 1;
        match geocoder.lookup(&key) {
            Some(coordinates) => {
                table.set_cell(row, schema.latitude, coordinates.latitude.to_string());
                table.set_cell(row, schema.longitude, coordinates.longitude.to_string());
                debug!(row, query = %key, "lookup resolved");
                successes.push(key);
            }
            None => {
                debug!(row, query = %key, "lookup missed");
                failures.push(key);
            }
        }
    }

    let (usage, ledger_warning) = match ledger.record_usage(calls_this_run) {
        Ok(totals) => (Some(totals), None),
        Err(err) => {
            let warning = format!("{err:#}");
            warn!(ledger = %ledger.path().display(), error = %warning, "usage ledger update failed");
            (None, Some(warning))
        }
    };

    Ok(RunOutcome {
        successes,
        failures,
        calls_this_run,
        usage,
        ledger_warning,
    })
}

/// Build the single-column failure report table.
pub fn failure_table(columns: &ColumnLabels, failures: &[String]) -> Table {
    Table::from_parts(
        vec![columns.failed_search_key.clone()],
        failures.iter().map(|key| vec![key.clone()]).collect(),
    )
}

/// Run the full enrichment workflow against files on disk.
pub fn run_run(args: &RunArgs) -> Result<()> {
    let config = config::load_or_default(args.config.as_deref())?;
    config::validate_config(&config)?;
    let api_key = resolve_api_key(args.api_key.as_deref()).ok_or_else(|| {
        anyhow!("no API key given; pass --api-key or set {API_KEY_ENV}")
    })?;

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("read input {}", args.input.display()))?;
    let mut table =
        Table::parse(&text).with_context(|| format!("parse input {}", args.input.display()))?;

    let geocoder = GeocodeClient::new(&config.endpoint, &config.language, api_key);
    let ledger = UsageLedger::new(resolve_ledger_path(args.ledger.as_deref())?);

    info!(
        rows = table.row_count(),
        columns = table.headers().len(),
        input = %args.input.display(),
        "starting enrichment"
    );
    let outcome = run_enrichment(&mut table, &config.columns, &geocoder, &ledger)?;

    let out_path = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from("geocoded_result.csv"));
    fs::write(&out_path, table.to_csv())
        .with_context(|| format!("write {}", out_path.display()))?;
    println!(
        "enriched table written to {}: {} lookups this run ({} succeeded, {} failed)",
        out_path.display(),
        outcome.calls_this_run,
        outcome.successes.len(),
        outcome.failures.len()
    );

    if !outcome.failures.is_empty() {
        let failed_path = args
            .failed_out
            .clone()
            .unwrap_or_else(|| PathBuf::from("geocode_failed.csv"));
        let failed = failure_table(&config.columns, &outcome.failures);
        fs::write(&failed_path, failed.to_csv())
            .with_context(|| format!("write {}", failed_path.display()))?;
        println!("failed search keys written to {}", failed_path.display());
    }

    match (&outcome.usage, &outcome.ledger_warning) {
        (Some(usage), _) => print_usage_line(usage),
        (None, Some(warning)) => {
            eprintln!("warning: usage ledger update failed: {warning}");
            eprintln!("         the enriched table above is complete and was written anyway");
        }
        (None, None) => {}
    }
    Ok(())
}

/// Offline preflight: schema gate, pending-row count, and quota headroom.
pub fn run_check(args: &CheckArgs) -> Result<()> {
    let config = config::load_or_default(args.config.as_deref())?;
    config::validate_config(&config)?;

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("read input {}", args.input.display()))?;
    let table =
        Table::parse(&text).with_context(|| format!("parse input {}", args.input.display()))?;
    let schema = resolve_schema(&table, &config.columns)?;

    let pending = (0..table.row_count())
        .filter(|&row| {
            table.cell(row, schema.latitude).trim().is_empty()
                || table.cell(row, schema.longitude).trim().is_empty()
        })
        .count();

    let ledger = UsageLedger::new(resolve_ledger_path(args.ledger.as_deref())?);
    let usage = ledger.current_usage();

    println!(
        "{} of {} rows need coordinates",
        pending,
        table.row_count()
    );
    print_usage_line(&usage);
    if pending as i64 > usage.remaining {
        println!("note: pending lookups exceed the remaining monthly allotment");
    }
    Ok(())
}

/// Report the current month's usage from the ledger.
pub fn run_usage(args: &UsageArgs) -> Result<()> {
    let ledger = UsageLedger::new(resolve_ledger_path(args.ledger.as_deref())?);
    let usage = ledger.current_usage();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&usage)?);
    } else {
        print_usage_line(&usage);
    }
    Ok(())
}

/// Write a config stub for editing.
pub fn run_init_config(args: &InitConfigArgs) -> Result<()> {
    if args.out.exists() && !args.force {
        bail!(
            "config already exists at {}; pass --force to overwrite",
            args.out.display()
        );
    }
    fs::write(&args.out, config::config_stub())
        .with_context(|| format!("write {}", args.out.display()))?;
    println!("config stub written to {}", args.out.display());
    Ok(())
}

fn print_usage_line(usage: &UsageTotals) {
    println!(
        "monthly usage {}: {} calls used, {} remaining of {}",
        usage.month, usage.total, usage.remaining, MONTHLY_QUOTA_CAP
    );
}

/// Resolve the API key: explicit flag > environment variable.
///
/// The key is handed straight to the client and never logged or persisted.
fn resolve_api_key(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(|key| key.to_string())
        .or_else(|| env::var(API_KEY_ENV).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Resolve the ledger path: explicit flag > per-user data directory.
fn resolve_ledger_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine a data directory for the usage ledger"))?;
    Ok(data_dir.join("geofill").join("api_usage_log.json"))
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
