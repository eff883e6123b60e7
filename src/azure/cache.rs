//! Inventory snapshot files.
//!
//! A live inventory can be written to a dated JSON file for auditing, and a
//! snapshot file can be replayed instead of querying Azure.

use crate::models::InventorySnapshot;
use crate::BoxError;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};

/// Read an inventory snapshot from a JSON file.
///
/// # Returns
/// * `Ok(InventorySnapshot)` - The parsed snapshot
/// * `Err` - If the file is missing or not a valid snapshot
pub fn read_inventory_snapshot(snapshot_file: &Path) -> Result<InventorySnapshot, BoxError> {
    if !snapshot_file.exists() {
        return Err(format!("Snapshot file does not exist: {}", snapshot_file.display()).into());
    }
    log::info!("Reading inventory from snapshot file: {}", snapshot_file.display());

    let json = std::fs::read_to_string(snapshot_file)
        .map_err(|e| format!("Error reading snapshot {}: {e}", snapshot_file.display()))?;
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    let snapshot: InventorySnapshot = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        format!(
            "Error parsing snapshot {}: path={} error={}",
            snapshot_file.display(),
            e.path(),
            e
        )
    })?;
    Ok(snapshot)
}

/// File name for a snapshot taken now, dated in `timezone`.
pub fn snapshot_file_name(timezone: Tz) -> String {
    let now = chrono::Utc::now().with_timezone(&timezone);
    format!("inventory_snapshot_{}.json", now.format("%Y-%m-%d"))
}

/// Write `snapshot` to `dir`, replacing any snapshot of the same day.
pub fn write_inventory_snapshot(
    dir: &Path,
    timezone: Tz,
    snapshot: &InventorySnapshot,
) -> Result<PathBuf, BoxError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Error creating snapshot dir {}: {e}", dir.display()))?;
    let snapshot_file = dir.join(snapshot_file_name(timezone));

    let json = serde_json::to_string_pretty(snapshot).map_err(|e| format!("Error serializing JSON: {e}"))?;
    log::info!("Writing inventory snapshot: {}", snapshot_file.display());
    std::fs::write(&snapshot_file, json)
        .map_err(|e| format!("Error writing snapshot file {}: {e}", snapshot_file.display()))?;
    Ok(snapshot_file)
}
