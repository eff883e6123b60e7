//! Azure CLI and Resource Graph interaction.
//!
//! This module handles all Azure-related operations:
//! - [`cli`] - Command execution for Azure CLI
//! - [`graph`] - Azure Resource Graph queries
//! - [`cache`] - Inventory snapshot files
//! - [`source`] - The [`InventorySource`] seam used by a run

mod cache;
mod cli;
mod graph;
mod source;

// Re-export public types and functions
pub use cache::{read_inventory_snapshot, snapshot_file_name, write_inventory_snapshot};
pub use cli::run;
pub use graph::{GraphPage, GraphQuery};
pub use source::{inventory_source, AzGraphInventory, InventorySource, SnapshotFile};
