//! Content types attached to a protect surface location.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of identifiers stored in a protect surface state.
///
/// Serialized with the wire names used by the AUXO API.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentType {
    /// Azure resource ids.
    #[serde(rename = "azure_cloud")]
    CloudResourceId,
    /// IPv4 addresses and subnet prefixes.
    #[serde(rename = "ipv4")]
    Ipv4Address,
}

impl ContentType {
    /// Wire name of the content type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::CloudResourceId => "azure_cloud",
            ContentType::Ipv4Address => "ipv4",
        }
    }

    /// Identifiers of this type are kept unique per group and location.
    pub fn unique_per_location(&self) -> bool {
        matches!(self, ContentType::Ipv4Address)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
