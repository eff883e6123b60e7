//! Azure inventory records as returned by Resource Graph queries.
//!
//! Field names follow the `project` clauses of the queries in
//! [`crate::azure`]; nested ARM property bags keep their camelCase names.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Azure resource type of a virtual machine (lower case, as Resource Graph reports it).
pub const VIRTUAL_MACHINE_TYPE: &str = "microsoft.compute/virtualmachines";
/// Azure resource type of a virtual network.
pub const VIRTUAL_NETWORK_TYPE: &str = "microsoft.network/virtualnetworks";

/// Resource tags, `null` in Resource Graph when a resource has none.
pub type Tags = HashMap<String, String>;

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Common accessors for resources that can be assigned to a protect surface.
pub trait TaggedResource {
    fn id(&self) -> &str;
    fn location(&self) -> Option<&str>;
    fn tags(&self) -> Option<&Tags>;
}

/// Reference to another ARM resource by id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceRef {
    pub id: String,
}

/// Virtual machine with references to its network interfaces.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct VirtualMachine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<Tags>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub network_interfaces: Vec<ResourceRef>,
}

/// Network interface and its IP configurations.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NetworkInterface {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip_configurations: Vec<IpConfiguration>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct IpConfiguration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: IpConfigurationProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct IpConfigurationProperties {
    /// Unset while a dynamic address is not yet allocated.
    #[serde(rename = "privateIPAddress", default)]
    pub private_ip_address: Option<String>,
    #[serde(rename = "publicIPAddress", default)]
    pub public_ip_address: Option<ResourceRef>,
}

/// Public IP address resource.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PublicIpAddress {
    pub id: String,
    /// Unset for dynamic addresses that are not associated.
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Virtual network with its subnets.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct VirtualNetwork {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<Tags>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnets: Vec<Subnet>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Subnet {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: SubnetProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SubnetProperties {
    #[serde(rename = "addressPrefix", default)]
    pub address_prefix: Option<String>,
    #[serde(rename = "addressPrefixes", default)]
    pub address_prefixes: Option<Vec<String>>,
}

impl Subnet {
    /// All prefixes of the subnet, `addressPrefix` first, without repeats.
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = Vec::new();
        let single = self.properties.address_prefix.iter();
        let multiple = self.properties.address_prefixes.iter().flatten();
        for prefix in single.chain(multiple) {
            if !prefixes.contains(&prefix.as_str()) {
                prefixes.push(prefix);
            }
        }
        prefixes
    }
}

/// Any other resource in the subscription.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GenericResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<Tags>,
}

impl GenericResource {
    /// VMs and VNets are enumerated by their own queries.
    pub fn is_handled_separately(&self) -> bool {
        self.resource_type.eq_ignore_ascii_case(VIRTUAL_MACHINE_TYPE)
            || self.resource_type.eq_ignore_ascii_case(VIRTUAL_NETWORK_TYPE)
    }
}

macro_rules! tagged_resource {
    ($($ty:ty),*) => {
        $(impl TaggedResource for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn location(&self) -> Option<&str> {
                self.location.as_deref().filter(|l| !l.trim().is_empty())
            }
            fn tags(&self) -> Option<&Tags> {
                self.tags.as_ref()
            }
        })*
    };
}

tagged_resource!(VirtualMachine, VirtualNetwork, GenericResource);

/// Every listing needed for one reconciliation run.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub virtual_machines: Vec<VirtualMachine>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    pub public_ip_addresses: Vec<PublicIpAddress>,
    #[serde(default)]
    pub virtual_networks: Vec<VirtualNetwork>,
    #[serde(default)]
    pub resources: Vec<GenericResource>,
}

impl InventorySnapshot {
    /// Total number of records across all listings.
    pub fn len(&self) -> usize {
        self.virtual_machines.len()
            + self.network_interfaces.len()
            + self.public_ip_addresses.len()
            + self.virtual_networks.len()
            + self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
