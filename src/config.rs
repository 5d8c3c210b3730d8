//! Run configuration: column labels, endpoint, and response language.
//!
//! The input table uses fixed Japanese column labels by default; keeping them
//! in config (rather than scattered literals) lets a deployment rename
//! columns without touching the enrichment logic. Defaults reproduce the
//! original dataset layout and the Google geocoding endpoint.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current schema version for geofill config files.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

fn default_name_label() -> String {
    "施設名".to_string()
}

fn default_address_label() -> String {
    "住所".to_string()
}

fn default_latitude_label() -> String {
    "緯度".to_string()
}

fn default_longitude_label() -> String {
    "経度".to_string()
}

fn default_search_key_label() -> String {
    "検索キー".to_string()
}

fn default_failed_search_key_label() -> String {
    "失敗した検索キー".to_string()
}

fn default_endpoint() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_language() -> String {
    "ja".to_string()
}

/// Column labels for the facility table and derived outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabels {
    #[serde(default = "default_name_label")]
    pub name: String,
    #[serde(default = "default_address_label")]
    pub address: String,
    #[serde(default = "default_latitude_label")]
    pub latitude: String,
    #[serde(default = "default_longitude_label")]
    pub longitude: String,
    /// Derived column appended to the enriched output.
    #[serde(default = "default_search_key_label")]
    pub search_key: String,
    /// Header of the single-column failure report.
    #[serde(default = "default_failed_search_key_label")]
    pub failed_search_key: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            name: default_name_label(),
            address: default_address_label(),
            latitude: default_latitude_label(),
            longitude: default_longitude_label(),
            search_key: default_search_key_label(),
            failed_search_key: default_failed_search_key_label(),
        }
    }
}

/// User-editable configuration for a geofill run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub columns: ColumnLabels,
    /// Geocoding endpoint receiving the query, credential, and language.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Response localization requested from the geocoding service.
    #[serde(default = "default_language")]
    pub language: String,
}

/// Build the default config used when no `--config` file is given.
pub fn default_config() -> RunConfig {
    RunConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        columns: ColumnLabels::default(),
        endpoint: default_endpoint(),
        language: default_language(),
    }
}

/// Render a pretty JSON config stub for `init-config`.
pub fn config_stub() -> String {
    let config = default_config();
    serde_json::to_string_pretty(&config).expect("serialize config stub")
}

/// Load a config file from disk.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: RunConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config {}", path.display()))?;
    Ok(config)
}

/// Load the named config, or fall back to defaults when none is given.
pub fn load_or_default(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(default_config()),
    }
}

/// Validate config schema and labels before a run.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.endpoint.trim().is_empty() {
        return Err(anyhow!("endpoint must be non-empty"));
    }
    if config.language.trim().is_empty() {
        return Err(anyhow!("language must be non-empty"));
    }
    let labels = &config.columns;
    // The derived labels take part too: a search_key label colliding with a
    // coordinate column would overwrite coordinates in the output.
    let all = [
        &labels.name,
        &labels.address,
        &labels.latitude,
        &labels.longitude,
        &labels.search_key,
        &labels.failed_search_key,
    ];
    for label in all {
        if label.trim().is_empty() {
            return Err(anyhow!("column labels must be non-empty"));
        }
    }
    for (index, label) in all.iter().enumerate() {
        if all[index + 1..].contains(label) {
            return Err(anyhow!("duplicate column label {label:?}"));
        }
    }
    Ok(())
}
