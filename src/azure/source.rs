//! Where the inventory for a run comes from.

use super::cache::{read_inventory_snapshot, write_inventory_snapshot};
use super::graph::GraphQuery;
use crate::config::Config;
use crate::models::InventorySnapshot;
use crate::BoxError;
use async_trait::async_trait;
use chrono_tz::Tz;
use std::path::PathBuf;

/// Supplies one complete inventory listing per call.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn snapshot(&self) -> Result<InventorySnapshot, BoxError>;
}

/// Live inventory from Azure Resource Graph.
pub struct AzGraphInventory {
    query: GraphQuery,
    /// Directory receiving a copy of every fetched inventory.
    snapshot_dir: Option<PathBuf>,
    snapshot_timezone: Tz,
}

impl AzGraphInventory {
    pub fn new(config: &Config) -> AzGraphInventory {
        AzGraphInventory {
            query: GraphQuery::from_config(config),
            snapshot_dir: config.snapshot_dir.clone(),
            snapshot_timezone: config.snapshot_timezone,
        }
    }
}

#[async_trait]
impl InventorySource for AzGraphInventory {
    async fn snapshot(&self) -> Result<InventorySnapshot, BoxError> {
        let snapshot = self.query.snapshot().await?;
        if let Some(dir) = &self.snapshot_dir {
            // The run does not depend on the copy.
            if let Err(e) = write_inventory_snapshot(dir, self.snapshot_timezone, &snapshot) {
                log::warn!("Could not write inventory snapshot: {e}");
            }
        }
        Ok(snapshot)
    }
}

/// Inventory replayed from a snapshot file.
pub struct SnapshotFile {
    pub path: PathBuf,
}

#[async_trait]
impl InventorySource for SnapshotFile {
    async fn snapshot(&self) -> Result<InventorySnapshot, BoxError> {
        read_inventory_snapshot(&self.path)
    }
}

/// Choose the inventory source for `config`.
pub fn inventory_source(config: &Config) -> Box<dyn InventorySource> {
    match &config.snapshot_file {
        Some(path) => {
            log::warn!("Replaying inventory from {}", path.display());
            Box::new(SnapshotFile { path: path.clone() })
        }
        None => Box::new(AzGraphInventory::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_file_source() {
        let source = SnapshotFile {
            path: PathBuf::from("src/tests/test_data/inventory_snapshot_01.json"),
        };
        let snapshot = source.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.network_interfaces.len(), 3);
    }
}
