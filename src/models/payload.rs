//! Request bodies for the AUXO `upsert-protectsurface-location-state` call.

use super::{ContentType, LocationCoords};
use serde::{Deserialize, Serialize};

/// Relevance assigned to every protect surface created by the sync.
pub const PROTECT_SURFACE_RELEVANCE: u32 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    pub items: Vec<ProtectSurfaceLocationState>,
}

/// All states of one protect surface at one location.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProtectSurfaceLocationState {
    pub protectsurface_uniqueness_key: String,
    pub location_uniqueness_key: String,
    pub protectsurface_name: String,
    pub protectsurface_relevance: u32,
    pub location_name: String,
    pub location_coords: LocationCoords,
    pub states: Vec<StateContent>,
}

/// One content type worth of identifiers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StateContent {
    pub maintainer: String,
    pub description: String,
    pub content_type: ContentType,
    pub content: Vec<String>,
}

impl ProtectSurfaceLocationState {
    /// `{surface}@{location}` for log lines.
    pub fn label(&self) -> String {
        format!("{}@{}", self.protectsurface_name, self.location_name)
    }
}

/// Stable protect surface key: spaces become underscores.
pub fn surface_uniqueness_key(surface: &str) -> String {
    surface.replace(' ', "_")
}

/// Stable location key: `{location}_{lat}_{long}`.
pub fn location_uniqueness_key(location: &str, coords: LocationCoords) -> String {
    format!("{location}_{coords}")
}
