//! Index of the AUXO states this provider maintains, keyed by protect surface name.

use crate::auxo::AssetService;
use crate::models::{RemoteStateIndex, RemoteStateRecord};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::HashMap;

/// Result of indexing the remote states.
#[derive(Debug, Default, PartialEq)]
pub struct RemoteIndex {
    pub index: RemoteStateIndex,
    /// States maintained by this provider.
    pub owned: usize,
    /// Owned states left out because their protect surface name could not be resolved.
    pub skipped: usize,
}

/// Build the index from every remote state.
///
/// Each distinct protect surface id is resolved once, at most `concurrency`
/// lookups at a time. A failed lookup drops that surface's states from the
/// index, so they are never deleted on its account.
pub async fn build_remote_state_index<S: AssetService + ?Sized>(
    service: &S,
    records: &[RemoteStateRecord],
    provider_id: &str,
    concurrency: usize,
) -> RemoteIndex {
    let owned: Vec<&RemoteStateRecord> = records
        .iter()
        .filter(|r| r.is_maintained_by(provider_id))
        .collect();
    log::info!(
        "API maintained states: {} of {} states belong to {}",
        owned.len(),
        records.len(),
        provider_id
    );

    let surface_ids: Vec<&str> = owned
        .iter()
        .map(|r| r.protectsurface_id.as_str())
        .unique()
        .collect();

    let names: HashMap<&str, String> = stream::iter(surface_ids)
        .map(|id| async move { (id, service.get_protect_surface_name(id).await) })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|(id, result)| async move {
            match result {
                Ok(name) => Some((id, name)),
                Err(e) => {
                    log::warn!("Protect surface get request failed for {id}, its states are kept: {e}");
                    None
                }
            }
        })
        .collect()
        .await;

    let mut remote = RemoteIndex {
        owned: owned.len(),
        ..Default::default()
    };
    for record in owned {
        match names.get(record.protectsurface_id.as_str()) {
            Some(name) => remote
                .index
                .entry(name.clone())
                .or_default()
                .push(record.id.clone()),
            None => remote.skipped += 1,
        }
    }
    log::info!("API maintained states: {:?}", remote.index);
    remote
}
