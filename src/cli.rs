//! CLI argument parsing for the geocoding backfill workflow.
//!
//! The CLI is intentionally thin: it names input/output files and the
//! credential source, then hands everything to the workflow. The credential
//! itself can come from `GEOFILL_API_KEY` so it stays out of shell history.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "geofill",
    version,
    about = "Fill missing coordinates in facility tables via a geocoding API",
    after_help = "Examples:\n  geofill run --input facilities.csv --api-key KEY\n  geofill run --input facilities.csv --out enriched.csv --ledger usage.json\n  geofill check --input facilities.csv\n  geofill usage --json\n  geofill init-config --out geofill.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Check(CheckArgs),
    Usage(UsageArgs),
    InitConfig(InitConfigArgs),
}

/// Run command inputs for a full enrichment pass.
#[derive(Parser, Debug)]
#[command(about = "Enrich a CSV, write outputs, and record monthly usage")]
pub struct RunArgs {
    /// Input CSV with facility name, address, latitude, and longitude columns
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Enriched output CSV (default: geocoded_result.csv)
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Failure report CSV, written only when lookups failed
    /// (default: geocode_failed.csv)
    #[arg(long, value_name = "FILE")]
    pub failed_out: Option<PathBuf>,

    /// Geocoding API key (falls back to GEOFILL_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Config file overriding column labels, endpoint, or language
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Usage ledger file (default: under the user data directory)
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Log each lookup decision
    #[arg(long)]
    pub verbose: bool,
}

/// Check command inputs for the offline preflight.
#[derive(Parser, Debug)]
#[command(about = "Validate the input schema and report pending lookups (no network)")]
pub struct CheckArgs {
    /// Input CSV to validate
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Config file overriding column labels
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Usage ledger file (default: under the user data directory)
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,
}

/// Usage command inputs for quota reporting.
#[derive(Parser, Debug)]
#[command(about = "Report this month's API usage and remaining allotment")]
pub struct UsageArgs {
    /// Usage ledger file (default: under the user data directory)
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Init-config command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write a config stub for editing")]
pub struct InitConfigArgs {
    /// Destination path for the config stub
    #[arg(long, value_name = "FILE", default_value = "geofill.json")]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
