//! Records read back from the AUXO zero-trust API.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// AUXO ids are documented as strings but some endpoints return numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// A state stored in AUXO.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RemoteStateRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Provider id of whoever maintains the state; empty for manually managed states.
    #[serde(default)]
    pub maintainer: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub protectsurface_id: String,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

impl RemoteStateRecord {
    pub fn is_maintained_by(&self, provider_id: &str) -> bool {
        self.maintainer.as_deref() == Some(provider_id)
    }
}

/// Body of `get-states`.
///
/// Items are kept as raw JSON so one malformed record does not reject the whole listing.
#[derive(Deserialize, Debug, Default)]
pub struct StatesResponse {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

impl StatesResponse {
    /// Decoded records, plus the decode error of every item that was dropped.
    pub fn into_records(self) -> (Vec<RemoteStateRecord>, Vec<String>) {
        let mut records = Vec::with_capacity(self.items.len());
        let mut rejected = Vec::new();
        for (n, item) in self.items.into_iter().enumerate() {
            match serde_path_to_error::deserialize::<_, RemoteStateRecord>(item) {
                Ok(record) => records.push(record),
                Err(e) => rejected.push(format!("items[{n}].{}: {}", e.path(), e.inner())),
            }
        }
        (records, rejected)
    }
}

/// Body of `get-protectsurface`.
#[derive(Deserialize, Debug, Default)]
pub struct ProtectSurfaceResponse {
    #[serde(default)]
    pub items: Vec<ProtectSurfaceSummary>,
}

#[derive(Deserialize, Debug)]
pub struct ProtectSurfaceSummary {
    pub name: String,
}

/// protect surface name -> ids of the states this provider maintains in it.
pub type RemoteStateIndex = BTreeMap<String, Vec<String>>;
