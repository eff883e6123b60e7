//! Intended protect surface state built from the Azure inventory.

use super::ContentType;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identifiers per content type at one location.
pub type LocationContents = BTreeMap<ContentType, Vec<String>>;
/// Locations of one protect surface.
pub type SurfaceLocations = BTreeMap<String, LocationContents>;

/// protect surface name -> location -> content type -> identifiers.
///
/// Group and location keys iterate sorted; identifiers keep insertion order.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct IntendedState {
    surfaces: BTreeMap<String, SurfaceLocations>,
}

impl IntendedState {
    pub fn new() -> IntendedState {
        IntendedState::default()
    }

    /// Append `identifier`, creating the surface, location and content type as needed.
    ///
    /// No de-duplication happens here; callers guard the ipv4 rule with [`Self::contains`].
    pub fn record(
        mut self,
        surface: &str,
        location: &str,
        content_type: ContentType,
        identifier: &str,
    ) -> IntendedState {
        self.surfaces
            .entry(surface.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .entry(content_type)
            .or_default()
            .push(identifier.to_string());
        self
    }

    /// True if `identifier` is already recorded for this surface, location and content type.
    pub fn contains(
        &self,
        surface: &str,
        location: &str,
        content_type: ContentType,
        identifier: &str,
    ) -> bool {
        self.get(surface, location, content_type)
            .is_some_and(|ids| ids.iter().any(|id| id == identifier))
    }

    pub fn get(&self, surface: &str, location: &str, content_type: ContentType) -> Option<&[String]> {
        self.surfaces
            .get(surface)?
            .get(location)?
            .get(&content_type)
            .map(|ids| ids.as_slice())
    }

    pub fn contains_surface(&self, surface: &str) -> bool {
        self.surfaces.contains_key(surface)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (&String, &SurfaceLocations)> {
        self.surfaces.iter()
    }

    /// Number of (surface, location) pairs, i.e. upserts per run.
    pub fn location_count(&self) -> usize {
        self.surfaces.values().map(|l| l.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_creates_levels() {
        let state = IntendedState::new().record(
            "team-payments",
            "eastus",
            ContentType::CloudResourceId,
            "vm-1",
        );
        assert_eq!(state.len(), 1);
        assert_eq!(state.location_count(), 1);
        assert_eq!(
            state.get("team-payments", "eastus", ContentType::CloudResourceId),
            Some(&["vm-1".to_string()][..])
        );
        assert!(state
            .get("team-payments", "eastus", ContentType::Ipv4Address)
            .is_none());
    }

    #[test]
    fn test_record_keeps_order_and_duplicates() {
        let state = ["b", "a", "b"].iter().fold(IntendedState::new(), |s, id| {
            s.record("g", "l", ContentType::Ipv4Address, id)
        });
        assert_eq!(
            state.get("g", "l", ContentType::Ipv4Address).unwrap(),
            &["b", "a", "b"]
        );
        assert!(state.contains("g", "l", ContentType::Ipv4Address, "a"));
        assert!(!state.contains("g", "l", ContentType::CloudResourceId, "a"));
        assert!(!state.contains("g", "other", ContentType::Ipv4Address, "a"));
    }

    #[test]
    fn test_serialize_nested_json() {
        let state = IntendedState::new()
            .record("team-payments", "eastus", ContentType::CloudResourceId, "vm-1")
            .record("team-payments", "eastus", ContentType::Ipv4Address, "10.0.0.5")
            .record("team-payments", "westeurope", ContentType::CloudResourceId, "kv-1");
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"team-payments": {
                "eastus": {"azure_cloud": ["vm-1"], "ipv4": ["10.0.0.5"]},
                "westeurope": {"azure_cloud": ["kv-1"]}
            }})
        );
        assert_eq!(state.location_count(), 2);
    }
}
