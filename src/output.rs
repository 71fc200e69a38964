use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::record::NormalizedRecord;

/// `creators_<ISO timestamp with ':' and '.' replaced by '-'>.json`
pub fn run_filename(at: DateTime<Utc>) -> String {
    format!("creators_{}.json", at.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

/// Write one run's records as pretty JSON into `dir`, creating it if needed.
pub fn save_run(dir: &Path, records: &[NormalizedRecord]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join(run_filename(Utc::now()));
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Saved {} records to {:?}", records.len(), path);
    Ok(path)
}

/// Read a file written by `save_run`.
pub fn load_records(path: &Path) -> Result<Vec<NormalizedRecord>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("{:?} is not a saved run", path))
}
