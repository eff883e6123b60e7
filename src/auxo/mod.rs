//! AUXO zero-trust API access.
//!
//! - [`AssetService`] - the calls the reconciler depends on
//! - [`AuxoClient`] - HTTPS implementation
//! - [`DryRunService`] - passes reads through and only logs writes

mod client;
mod dry_run;

pub use client::AuxoClient;
pub use dry_run::DryRunService;

use crate::models::{ProtectSurfaceLocationState, RemoteStateRecord};
use crate::BoxError;
use async_trait::async_trait;

/// Operations against the asset-management service.
///
/// A non-success response is returned as `Err`; callers log it and carry on.
#[async_trait]
pub trait AssetService: Send + Sync {
    /// Create or replace the states of one protect surface location.
    async fn upsert_state(&self, item: &ProtectSurfaceLocationState) -> Result<(), BoxError>;

    /// Every state visible to the token.
    async fn get_states(&self) -> Result<Vec<RemoteStateRecord>, BoxError>;

    /// Display name of a protect surface.
    async fn get_protect_surface_name(&self, protect_surface_id: &str) -> Result<String, BoxError>;

    /// Remove one state.
    async fn delete_state(&self, state_id: &str) -> Result<(), BoxError>;
}
