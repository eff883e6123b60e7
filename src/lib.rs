// cargo watch -x 'fmt' -x 'run'

pub mod auxo;
pub mod azure;
pub mod config;
pub mod models;
pub mod processing;
pub mod testing;

use auxo::{AssetService, AuxoClient, DryRunService};
use config::Config;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use processing::{run_once, RunGuard, RunReport};

/// The AUXO client for `config`, wrapped in [`DryRunService`] when dry-run is set.
pub fn asset_service(config: &Config) -> Result<Box<dyn AssetService>, BoxError> {
    let client = AuxoClient::from_config(config)?;
    if config.dry_run {
        log::warn!("DRY_RUN set: upserts and deletes are logged, not sent");
        Ok(Box::new(DryRunService::new(client)))
    } else {
        Ok(Box::new(client))
    }
}
