//! Azure region to map coordinate lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate used for any region missing from [`REGION_COORDS`].
pub const DEFAULT_COORDS: LocationCoords = LocationCoords {
    lat: 35.0,
    long: -40.0,
};

/// Approximate datacenter coordinates per Azure region code.
pub const REGION_COORDS: &[(&str, f64, f64)] = &[
    ("westeurope", 38.13, -78.45),
    ("eastasia", 22.267, 114.188),
    ("southeastasia", 1.283, 103.833),
    ("centralus", 41.5908, -93.6208),
    ("eastus", 37.3719, -79.8164),
    ("eastus2", 36.6681, -78.3889),
    ("westus", 37.783, -122.417),
    ("northcentralus", 41.8819, -87.6278),
    ("southcentralus", 29.4167, -98.5),
    ("northeurope", 52.3667, 4.9),
    ("japanwest", 34.6939, 135.5022),
    ("japaneast", 35.68, 139.77),
    ("Japan East", 35.68, 139.77),
    ("brazilsouth", -23.55, -46.633),
    ("australiaeast", -33.86, 151.2094),
    ("australiasoutheast", -37.8136, 144.9631),
    ("southindia", 12.9822, 80.1636),
    ("centralindia", 18.5822, 73.9197),
    ("westindia", 19.088, 72.868),
    ("jioindiawest", 22.470701, 70.05773),
    ("jioindiacentral", 21.146633, 79.08886),
    ("canadacentral", 43.653, -79.383),
    ("canadaeast", 46.817, -71.217),
    ("uksouth", 50.941, -0.799),
    ("ukwest", 53.427, -3.084),
    ("westcentralus", 40.890, -110.234),
    ("westus2", 47.233, -119.852),
    ("koreacentral", 37.5665, 126.9780),
    ("koreasouth", 35.1796, 129.0756),
    ("francecentral", 46.3772, 2.3730),
    ("francesouth", 43.8345, 2.1972),
    ("australiacentral", -35.3075, 149.1244),
    ("australiacentral2", -35.3075, 149.1244),
    ("uaecentral", 24.466667, 54.366669),
    ("uaenorth", 25.266666, 55.316666),
    ("southafricanorth", -25.731340, 28.218370),
    ("southafricawest", -34.075691, 18.843266),
    ("switzerlandnorth", 47.451542, 8.564572),
    ("switzerlandwest", 46.204391, 6.143158),
    ("germanynorth", 53.073635, 8.806422),
    ("germanywestcentral", 50.110924, 8.682127),
    ("norwaywest", 58.969975, 5.733107),
    ("norwayeast", 59.913868, 10.752245),
    ("brazilsoutheast", -22.90278, -43.2075),
    ("westus3", 33.448376, -112.074036),
    ("swedencentral", 60.67488, 17.14127),
];

/// Latitude/longitude pair sent with every protect surface location.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LocationCoords {
    pub lat: f64,
    pub long: f64,
}

impl fmt::Display for LocationCoords {
    /// Renders `{lat}_{long}` keeping a decimal point on whole numbers (`35.0_-40.0`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}_{:?}", self.lat, self.long)
    }
}

/// Look up the coordinates of an Azure region, never failing.
pub fn coords_for(location_name: &str) -> LocationCoords {
    REGION_COORDS
        .iter()
        .find(|(name, _, _)| *name == location_name)
        .map(|&(_, lat, long)| LocationCoords { lat, long })
        .unwrap_or(DEFAULT_COORDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_region() {
        let c = coords_for("eastus");
        assert_eq!(c.lat, 37.3719);
        assert_eq!(c.long, -79.8164);
    }

    #[test]
    fn test_unknown_region_uses_default() {
        for name in ["", "mars", "EASTUS", "east us"] {
            assert_eq!(coords_for(name), DEFAULT_COORDS, "input {name:?}");
        }
        assert_eq!(coords_for("mars").lat, 35.0);
        assert_eq!(coords_for("mars").long, -40.0);
    }

    #[test]
    fn test_table_has_no_duplicate_names() {
        let mut names: Vec<&str> = REGION_COORDS.iter().map(|(n, _, _)| *n).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), REGION_COORDS.len());
    }

    #[test]
    fn test_display_keeps_decimal_point() {
        assert_eq!(DEFAULT_COORDS.to_string(), "35.0_-40.0");
        assert_eq!(coords_for("eastus").to_string(), "37.3719_-79.8164");
        assert_eq!(coords_for("southcentralus").to_string(), "29.4167_-98.5");
    }
}
