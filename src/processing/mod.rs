//! Reconciliation logic.
//!
//! - [`enumerate`] - inventory records to (surface, location, type, identifier) events
//! - [`remote_index`] - maintained AUXO states grouped by protect surface name
//! - [`reconcile`] - upsert and delete passes
//! - [`run`] - one full run, its report and the overlap guard

mod enumerate;
mod reconcile;
mod remote_index;
mod run;

// Re-export public functions
pub use enumerate::{
    build_intended_state, intended_state_from_snapshot, inventory_events, protect_surface_name,
    InventoryEvent, UNIDENTIFIED_SURFACE,
};
pub use reconcile::{delete_all, stale_states, upsert_all, upsert_items, PassReport, StaleState};
pub use remote_index::{build_remote_state_index, RemoteIndex};
pub use run::{run_once, RunGuard, RunPermit, RunReport};
