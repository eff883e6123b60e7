//! One reconciliation run: enumerate, aggregate, upsert, delete.

use super::enumerate::intended_state_from_snapshot;
use super::reconcile::{delete_all, stale_states, upsert_all, upsert_items, PassReport};
use super::remote_index::{build_remote_state_index, RemoteIndex};
use crate::auxo::AssetService;
use crate::azure::InventorySource;
use crate::config::SyncSettings;
use crate::BoxError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// What a run did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub surfaces: usize,
    pub locations: usize,
    pub upserts: PassReport,
    pub owned_states: usize,
    /// Owned states left alone because their protect surface name was not resolved.
    pub unresolved_states: usize,
    pub deletes: PassReport,
    /// True when the remote states could not be listed and nothing was deleted.
    pub delete_pass_skipped: bool,
    pub elapsed: Duration,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} surfaces / {} locations, upserts ok={} failed={}, owned states={} unresolved={}, deletes ok={} failed={}{}, took {:.1?}",
            self.surfaces,
            self.locations,
            self.upserts.succeeded,
            self.upserts.failed,
            self.owned_states,
            self.unresolved_states,
            self.deletes.succeeded,
            self.deletes.failed,
            if self.delete_pass_skipped { " (delete pass skipped)" } else { "" },
            self.elapsed
        )
    }
}

/// List remote states and index the maintained ones; `None` if listing failed.
async fn fetch_remote_index<S: AssetService + ?Sized>(service: &S, settings: &SyncSettings) -> Option<RemoteIndex> {
    match service.get_states().await {
        Ok(records) => Some(
            build_remote_state_index(service, &records, &settings.provider_id, settings.max_concurrency).await,
        ),
        Err(e) => {
            log::error!("States get request failed, skipping deletes this run: {e}");
            None
        }
    }
}

/// Run one full reconciliation.
///
/// Inventory errors abort the run before anything is sent. Individual sync
/// call failures are logged and counted in the report.
pub async fn run_once<I, S>(inventory: &I, service: &S, settings: &SyncSettings) -> Result<RunReport, BoxError>
where
    I: InventorySource + ?Sized,
    S: AssetService + ?Sized,
{
    let started = Instant::now();
    log::info!("#Start run_once()");

    let snapshot = inventory
        .snapshot()
        .await
        .map_err(|e| format!("Inventory access failed, nothing synced: {e}"))?;
    if snapshot.is_empty() {
        log::warn!("Inventory is empty, every maintained protect surface will be deleted");
    }
    let state = intended_state_from_snapshot(&snapshot, &settings.protect_surface_tag)
        .map_err(|e| format!("Inventory data error, nothing synced: {e}"))?;
    drop(snapshot);

    let mut report = RunReport {
        surfaces: state.len(),
        locations: state.location_count(),
        ..Default::default()
    };
    log::info!(
        "Intended state: {} protect surfaces over {} locations",
        report.surfaces,
        report.locations
    );

    let items = upsert_items(&state, &settings.provider_id);
    let (upserts, remote) = tokio::join!(
        upsert_all(service, items, settings.max_concurrency),
        fetch_remote_index(service, settings)
    );
    report.upserts = upserts;

    match remote {
        Some(remote) => {
            report.owned_states = remote.owned;
            report.unresolved_states = remote.skipped;
            let stale = stale_states(&state, &remote.index);
            if stale.is_empty() {
                log::info!("No unused API maintained states to delete");
            }
            report.deletes = delete_all(service, stale, settings.max_concurrency).await;
        }
        None => report.delete_pass_skipped = true,
    }

    report.elapsed = started.elapsed();
    log::info!("#End run_once() {report}");
    Ok(report)
}

/// Refuses to start a run while another is in progress.
#[derive(Debug, Default)]
pub struct RunGuard {
    in_progress: AtomicBool,
}

/// Held for the duration of a run; releases the guard on drop.
#[derive(Debug)]
pub struct RunPermit<'a> {
    guard: &'a RunGuard,
}

impl RunGuard {
    pub fn new() -> RunGuard {
        RunGuard::default()
    }

    /// `None` if a run is already in progress.
    pub fn try_begin(&self) -> Option<RunPermit<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit { guard: self })
    }

    /// Run once unless another run holds the guard.
    pub async fn run<I, S>(&self, inventory: &I, service: &S, settings: &SyncSettings) -> Result<RunReport, BoxError>
    where
        I: InventorySource + ?Sized,
        S: AssetService + ?Sized,
    {
        let Some(_permit) = self.try_begin() else {
            log::warn!("Previous run still in progress, skipping this trigger");
            return Err("Previous run still in progress, skipping this trigger".into());
        };
        run_once(inventory, service, settings).await
    }
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_progress.store(false, Ordering::Release);
    }
}
