//! Reconciliation of the intended state against AUXO.
//!
//! Upserts every protect surface location of the intended state, then deletes
//! the maintained states of protect surfaces that no longer have resources.

use crate::auxo::AssetService;
use crate::models::{
    coords_for, location_uniqueness_key, surface_uniqueness_key, IntendedState,
    ProtectSurfaceLocationState, RemoteStateIndex, StateContent, PROTECT_SURFACE_RELEVANCE,
};
use futures::stream::{self, StreamExt};

/// Outcome of one pass over independent calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// A remote state scheduled for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleState {
    pub surface: String,
    pub state_id: String,
}

/// One upsert item per (protect surface, location) of `state`, in key order.
pub fn upsert_items(state: &IntendedState, provider_id: &str) -> Vec<ProtectSurfaceLocationState> {
    let mut items = Vec::with_capacity(state.location_count());
    for (surface, locations) in state.surfaces() {
        for (location, contents) in locations {
            let coords = coords_for(location);
            let states = contents
                .iter()
                .map(|(content_type, identifiers)| StateContent {
                    maintainer: provider_id.to_string(),
                    description: format!("{surface} {content_type}"),
                    content_type: *content_type,
                    content: identifiers.clone(),
                })
                .collect();
            items.push(ProtectSurfaceLocationState {
                protectsurface_uniqueness_key: surface_uniqueness_key(surface),
                location_uniqueness_key: location_uniqueness_key(location, coords),
                protectsurface_name: surface.clone(),
                protectsurface_relevance: PROTECT_SURFACE_RELEVANCE,
                location_name: location.clone(),
                location_coords: coords,
                states,
            });
        }
    }
    items
}

/// Maintained states whose protect surface is absent from `state`.
pub fn stale_states(state: &IntendedState, remote: &RemoteStateIndex) -> Vec<StaleState> {
    remote
        .iter()
        .filter(|(surface, _)| !state.contains_surface(surface))
        .flat_map(|(surface, ids)| {
            ids.iter().map(move |id| StaleState {
                surface: surface.clone(),
                state_id: id.clone(),
            })
        })
        .collect()
}

/// Send every upsert, at most `concurrency` in flight. Failures are logged.
pub async fn upsert_all<S: AssetService + ?Sized>(
    service: &S,
    items: Vec<ProtectSurfaceLocationState>,
    concurrency: usize,
) -> PassReport {
    stream::iter(items)
        .map(|item| async move {
            let result = service.upsert_state(&item).await;
            (item, result)
        })
        .buffer_unordered(concurrency.max(1))
        .fold(PassReport::default(), |mut report, (item, result)| async move {
            match result {
                Ok(()) => {
                    log::info!("Upsert to {} Successful", item.label());
                    report.succeeded += 1;
                }
                Err(e) => {
                    log::error!("Unable to Upsert {}: {e}", item.label());
                    report.failed += 1;
                }
            }
            report
        })
        .await
}

/// Delete every stale state, at most `concurrency` in flight. Failures are logged.
pub async fn delete_all<S: AssetService + ?Sized>(
    service: &S,
    stale: Vec<StaleState>,
    concurrency: usize,
) -> PassReport {
    stream::iter(stale)
        .map(|stale| async move {
            let result = service.delete_state(&stale.state_id).await;
            (stale, result)
        })
        .buffer_unordered(concurrency.max(1))
        .fold(PassReport::default(), |mut report, (stale, result)| async move {
            match result {
                Ok(()) => {
                    log::info!("Successfully deleted state {}:{}", stale.surface, stale.state_id);
                    report.succeeded += 1;
                }
                Err(e) => {
                    log::error!("Failed to delete state {}:{}: {e}", stale.surface, stale.state_id);
                    report.failed += 1;
                }
            }
            report
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use crate::testing::RecordingService;
    use std::collections::BTreeMap;

    fn payments_state() -> IntendedState {
        IntendedState::new()
            .record("team payments", "eastus", ContentType::CloudResourceId, "vm-1")
            .record("team payments", "eastus", ContentType::Ipv4Address, "10.0.0.5")
            .record("team payments", "eastus", ContentType::Ipv4Address, "10.0.0.0/24")
            .record("team payments", "atlantis", ContentType::CloudResourceId, "kv-1")
    }

    #[test]
    fn test_upsert_items_one_block_per_content_type() {
        let items = upsert_items(&payments_state(), "prov");
        assert_eq!(items.len(), 2);

        let atlantis = &items[0];
        assert_eq!(atlantis.location_name, "atlantis");
        assert_eq!(atlantis.location_uniqueness_key, "atlantis_35.0_-40.0");
        assert_eq!(atlantis.states.len(), 1);

        let eastus = &items[1];
        assert_eq!(eastus.protectsurface_uniqueness_key, "team_payments");
        assert_eq!(eastus.protectsurface_name, "team payments");
        assert_eq!(eastus.protectsurface_relevance, 60);
        assert_eq!(eastus.location_uniqueness_key, "eastus_37.3719_-79.8164");
        assert_eq!(eastus.states.len(), 2);
        assert_eq!(eastus.states[0].content_type, ContentType::CloudResourceId);
        assert_eq!(eastus.states[0].content, vec!["vm-1"]);
        assert_eq!(eastus.states[0].description, "team payments azure_cloud");
        assert_eq!(eastus.states[1].content_type, ContentType::Ipv4Address);
        assert_eq!(eastus.states[1].content, vec!["10.0.0.5", "10.0.0.0/24"]);
        assert_eq!(eastus.states[1].maintainer, "prov");
    }

    #[test]
    fn test_upsert_items_are_deterministic() {
        assert_eq!(
            upsert_items(&payments_state(), "prov"),
            upsert_items(&payments_state(), "prov")
        );
    }

    #[test]
    fn test_stale_states_only_for_missing_surfaces() {
        let mut remote: RemoteStateIndex = BTreeMap::new();
        remote.insert("legacy-app".to_string(), vec!["s-1".to_string(), "s-2".to_string()]);
        remote.insert("team payments".to_string(), vec!["s-3".to_string()]);

        let stale = stale_states(&payments_state(), &remote);
        assert_eq!(
            stale,
            vec![
                StaleState {
                    surface: "legacy-app".to_string(),
                    state_id: "s-1".to_string()
                },
                StaleState {
                    surface: "legacy-app".to_string(),
                    state_id: "s-2".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_upsert_failures_do_not_stop_others() {
        let state = payments_state().record("ops", "eastus", ContentType::CloudResourceId, "vm-9");
        let mut service = RecordingService::new();
        service.failing_upserts.insert("ops".to_string());

        let report = upsert_all(&service, upsert_items(&state, "prov"), 2).await;
        assert_eq!(report, PassReport { succeeded: 2, failed: 1 });
        assert_eq!(service.upserts().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_failures_do_not_stop_others() {
        let mut service = RecordingService::new();
        service.failing_deletes.insert("s-2".to_string());
        let stale = ["s-1", "s-2", "s-3"]
            .iter()
            .map(|id| StaleState {
                surface: "legacy-app".to_string(),
                state_id: id.to_string(),
            })
            .collect();

        let report = delete_all(&service, stale, 3).await;
        assert_eq!(report, PassReport { succeeded: 2, failed: 1 });
        assert_eq!(service.deletes(), vec!["s-1", "s-3"]);
    }
}
