//! Dry-run wrapper: reads hit the real service, writes are only logged.

use super::AssetService;
use crate::models::{ProtectSurfaceLocationState, RemoteStateRecord};
use crate::BoxError;
use async_trait::async_trait;

pub struct DryRunService<S> {
    inner: S,
}

impl<S: AssetService> DryRunService<S> {
    pub fn new(inner: S) -> DryRunService<S> {
        DryRunService { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: AssetService> AssetService for DryRunService<S> {
    async fn upsert_state(&self, item: &ProtectSurfaceLocationState) -> Result<(), BoxError> {
        let counts: Vec<String> = item
            .states
            .iter()
            .map(|s| format!("{}={}", s.content_type, s.content.len()))
            .collect();
        log::info!(
            "[DRY RUN] Would upsert {} ({}) [{}]",
            item.label(),
            item.location_uniqueness_key,
            counts.join(", ")
        );
        Ok(())
    }

    async fn get_states(&self) -> Result<Vec<RemoteStateRecord>, BoxError> {
        self.inner.get_states().await
    }

    async fn get_protect_surface_name(&self, protect_surface_id: &str) -> Result<String, BoxError> {
        self.inner.get_protect_surface_name(protect_surface_id).await
    }

    async fn delete_state(&self, state_id: &str) -> Result<(), BoxError> {
        log::info!("[DRY RUN] Would delete state {state_id}");
        Ok(())
    }
}
