pub mod csv_types;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Offline data for one ticker: the spot at capture time and its two CSV files.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ManifestEntry {
    pub spot: f64,
    pub history: String,
    pub puts: String,
}

/// `manifest.json`: when the data was captured and where each ticker's files live.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Manifest {
    pub as_of: NaiveDate,
    pub tickers: BTreeMap<String, ManifestEntry>,
}

/// Load the data manifest from `manifest.json` in the data directory.
pub fn load_manifest(data_dir: &Path) -> Result<Manifest> {
    let manifest_path = data_dir.join("manifest.json");
    let contents = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("reading manifest at {}", manifest_path.display()))?;
    let manifest: Manifest =
        serde_json::from_str(&contents).with_context(|| "parsing manifest.json")?;
    Ok(manifest)
}

/// Write `manifest.json` into the data directory.
pub fn write_manifest(data_dir: &Path, manifest: &Manifest) -> Result<()> {
    let path = data_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(&path, json).context("writing manifest.json")?;
    Ok(())
}

/// Load CSV rows of type T from a file in the data directory.
pub fn load_csv<T: for<'de> Deserialize<'de>>(data_dir: &Path, filename: &str) -> Result<Vec<T>> {
    let path = data_dir.join(filename);
    let mut rdr = csv::Reader::from_path(&path)
        .with_context(|| format!("opening CSV file {}", path.display()))?;
    let rows: Vec<T> = rdr
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parsing CSV file {}", path.display()))?;
    Ok(rows)
}

/// Write rows of type T to a CSV file in the data directory.
pub fn write_csv<T: Serialize>(data_dir: &Path, filename: &str, rows: &[T]) -> Result<()> {
    let path = data_dir.join(filename);
    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("creating CSV file {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Sanitize a ticker for use as a filename component.
pub fn sanitize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c == '/' || c == ' ' || c == '.' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
