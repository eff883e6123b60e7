//! Resource enumeration.
//!
//! Turns an [`InventorySnapshot`] into a lazy stream of [`InventoryEvent`]s and
//! folds them into the [`IntendedState`].

use crate::models::{
    ContentType, IntendedState, InventorySnapshot, NetworkInterface, PublicIpAddress,
    TaggedResource, VirtualMachine, VirtualNetwork,
};
use crate::BoxError;
use std::collections::HashMap;

/// Protect surface for resources without the ownership tag.
pub const UNIDENTIFIED_SURFACE: &str = "Unidentified Resources";

/// One identifier to record under a protect surface and location.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEvent {
    pub surface: String,
    pub location: String,
    pub content_type: ContentType,
    pub identifier: String,
}

impl InventoryEvent {
    fn new(surface: &str, location: &str, content_type: ContentType, identifier: &str) -> InventoryEvent {
        InventoryEvent {
            surface: surface.to_string(),
            location: location.to_string(),
            content_type,
            identifier: identifier.to_string(),
        }
    }
}

/// Protect surface name from the ownership tag, or [`UNIDENTIFIED_SURFACE`].
pub fn protect_surface_name<R: TaggedResource + ?Sized>(resource: Option<&R>, tag: &str) -> String {
    resource
        .and_then(|r| r.tags())
        .and_then(|tags| tags.get(tag))
        .filter(|name| !name.trim().is_empty())
        .map(|name| name.to_string())
        .unwrap_or_else(|| UNIDENTIFIED_SURFACE.to_string())
}

/// The resource's own location; a resource without one is a data error.
fn required_location<R: TaggedResource + ?Sized>(resource: &R) -> Result<&str, BoxError> {
    resource
        .location()
        .ok_or_else(|| format!("Resource has no location: {}", resource.id()).into())
}

/// Network lookups keyed by lower-cased resource id.
struct NetworkIndex<'a> {
    interfaces: HashMap<String, &'a NetworkInterface>,
    public_ips: HashMap<String, &'a PublicIpAddress>,
}

impl<'a> NetworkIndex<'a> {
    fn new(snapshot: &'a InventorySnapshot) -> NetworkIndex<'a> {
        NetworkIndex {
            interfaces: snapshot
                .network_interfaces
                .iter()
                .map(|nic| (nic.id.to_lowercase(), nic))
                .collect(),
            public_ips: snapshot
                .public_ip_addresses
                .iter()
                .map(|pip| (pip.id.to_lowercase(), pip))
                .collect(),
        }
    }

    fn interface(&self, id: &str) -> Option<&'a NetworkInterface> {
        self.interfaces.get(&id.to_lowercase()).copied()
    }

    fn public_ip(&self, id: &str) -> Option<&'a PublicIpAddress> {
        self.public_ips.get(&id.to_lowercase()).copied()
    }
}

type EventResult = Result<InventoryEvent, BoxError>;

/// VM id plus one ipv4 event per private and public address on its NICs.
fn virtual_machine_events(vm: &VirtualMachine, network: &NetworkIndex, tag: &str) -> Vec<EventResult> {
    let location = match required_location(vm) {
        Ok(location) => location,
        Err(e) => return vec![Err(e)],
    };
    let surface = protect_surface_name(Some(vm), tag);
    let mut events = vec![Ok(InventoryEvent::new(
        &surface,
        location,
        ContentType::CloudResourceId,
        &vm.id,
    ))];

    for nic_ref in &vm.network_interfaces {
        let Some(nic) = network.interface(&nic_ref.id) else {
            log::warn!("VM {} references unknown network interface {}", vm.name, nic_ref.id);
            continue;
        };
        for ip_config in &nic.ip_configurations {
            match &ip_config.properties.private_ip_address {
                Some(address) => events.push(Ok(InventoryEvent::new(
                    &surface,
                    location,
                    ContentType::Ipv4Address,
                    address,
                ))),
                None => log::debug!("NIC {} has an ip configuration without private address", nic.id),
            }

            let Some(pip_ref) = &ip_config.properties.public_ip_address else {
                continue;
            };
            match network.public_ip(&pip_ref.id).and_then(|pip| pip.ip_address.as_deref()) {
                Some(address) => events.push(Ok(InventoryEvent::new(
                    &surface,
                    location,
                    ContentType::Ipv4Address,
                    address,
                ))),
                None => log::warn!("Public IP {} of VM {} has no allocated address", pip_ref.id, vm.name),
            }
        }
    }
    events
}

/// VNet id plus one ipv4 event per subnet prefix.
fn virtual_network_events(vnet: &VirtualNetwork, tag: &str) -> Vec<EventResult> {
    let location = match required_location(vnet) {
        Ok(location) => location,
        Err(e) => return vec![Err(e)],
    };
    let surface = protect_surface_name(Some(vnet), tag);
    let mut events = vec![Ok(InventoryEvent::new(
        &surface,
        location,
        ContentType::CloudResourceId,
        &vnet.id,
    ))];
    for subnet in &vnet.subnets {
        let prefixes = subnet.prefixes();
        if prefixes.is_empty() {
            log::debug!("Subnet {} in {} has no address prefix", subnet.name, vnet.name);
        }
        events.extend(
            prefixes
                .into_iter()
                .map(|prefix| Ok(InventoryEvent::new(&surface, location, ContentType::Ipv4Address, prefix))),
        );
    }
    events
}

/// Lazily enumerate every event of `snapshot`: VMs, then VNets, then all other resources.
///
/// Resources without a location yield an `Err` item.
pub fn inventory_events<'a>(
    snapshot: &'a InventorySnapshot,
    tag: &'a str,
) -> impl Iterator<Item = EventResult> + 'a {
    let network = NetworkIndex::new(snapshot);

    let vms = snapshot
        .virtual_machines
        .iter()
        .flat_map(move |vm| virtual_machine_events(vm, &network, tag));

    let vnets = snapshot
        .virtual_networks
        .iter()
        .flat_map(move |vnet| virtual_network_events(vnet, tag));

    let others = snapshot
        .resources
        .iter()
        .filter(|r| !r.is_handled_separately())
        .map(move |r| -> EventResult {
            let location = required_location(r)?;
            Ok(InventoryEvent::new(
                &protect_surface_name(Some(r), tag),
                location,
                ContentType::CloudResourceId,
                &r.id,
            ))
        });

    vms.chain(vnets).chain(others)
}

/// Fold events into the intended state.
///
/// An ipv4 identifier already recorded for the same surface and location is
/// skipped; every other event is appended. The first error aborts the fold.
pub fn build_intended_state<I>(events: I) -> Result<IntendedState, BoxError>
where
    I: IntoIterator<Item = EventResult>,
{
    events.into_iter().try_fold(IntendedState::new(), |state, event| {
        let event = event?;
        if event.content_type.unique_per_location()
            && state.contains(&event.surface, &event.location, event.content_type, &event.identifier)
        {
            log::debug!(
                "Skip duplicate {} {} in {}@{}",
                event.content_type,
                event.identifier,
                event.surface,
                event.location
            );
            return Ok(state);
        }
        Ok(state.record(&event.surface, &event.location, event.content_type, &event.identifier))
    })
}

/// Enumerate `snapshot` and build its intended state.
pub fn intended_state_from_snapshot(snapshot: &InventorySnapshot, tag: &str) -> Result<IntendedState, BoxError> {
    build_intended_state(inventory_events(snapshot, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        GenericResource, IpConfiguration, IpConfigurationProperties, ResourceRef, Subnet,
        SubnetProperties, Tags,
    };
    use serde_json::json;

    const TAG: &str = "protectsurface";

    fn tags(value: &str) -> Option<Tags> {
        Some([(TAG.to_string(), value.to_string())].into_iter().collect())
    }

    fn vm(id: &str, location: &str, surface: Option<&str>, nics: &[&str]) -> VirtualMachine {
        VirtualMachine {
            id: id.to_string(),
            name: id.to_string(),
            location: Some(location.to_string()),
            tags: surface.and_then(tags),
            network_interfaces: nics.iter().map(|n| ResourceRef { id: n.to_string() }).collect(),
        }
    }

    fn nic(id: &str, private: &str, public: Option<&str>) -> NetworkInterface {
        NetworkInterface {
            id: id.to_string(),
            ip_configurations: vec![IpConfiguration {
                name: Some("ipconfig1".to_string()),
                properties: IpConfigurationProperties {
                    private_ip_address: Some(private.to_string()),
                    public_ip_address: public.map(|p| ResourceRef { id: p.to_string() }),
                },
            }],
        }
    }

    fn vnet(id: &str, location: &str, surface: Option<&str>, prefixes: &[&str]) -> VirtualNetwork {
        VirtualNetwork {
            id: id.to_string(),
            name: id.to_string(),
            location: Some(location.to_string()),
            tags: surface.and_then(tags),
            subnets: prefixes
                .iter()
                .enumerate()
                .map(|(i, p)| Subnet {
                    name: format!("subnet-{i}"),
                    properties: SubnetProperties {
                        address_prefix: Some(p.to_string()),
                        address_prefixes: None,
                    },
                })
                .collect(),
        }
    }

    fn resource(id: &str, resource_type: &str, location: Option<&str>, surface: Option<&str>) -> GenericResource {
        GenericResource {
            id: id.to_string(),
            name: id.to_string(),
            resource_type: resource_type.to_string(),
            location: location.map(|l| l.to_string()),
            tags: surface.and_then(tags),
        }
    }

    #[test]
    fn test_surface_name_fallbacks() {
        let tagged = vm("vm-1", "eastus", Some("team-payments"), &[]);
        assert_eq!(protect_surface_name(Some(&tagged), TAG), "team-payments");

        let untagged = vm("vm-2", "eastus", None, &[]);
        assert_eq!(protect_surface_name(Some(&untagged), TAG), UNIDENTIFIED_SURFACE);

        let other_tag = VirtualMachine {
            tags: Some([("owner".to_string(), "bob".to_string())].into_iter().collect()),
            ..untagged.clone()
        };
        assert_eq!(protect_surface_name(Some(&other_tag), TAG), UNIDENTIFIED_SURFACE);
        assert_eq!(protect_surface_name::<VirtualMachine>(None, TAG), UNIDENTIFIED_SURFACE);
    }

    #[test]
    fn test_blank_tag_value_is_unidentified() {
        let snapshot = InventorySnapshot {
            resources: vec![
                resource("kv-1", "Microsoft.KeyVault/vaults", Some("eastus"), Some("")),
                resource("kv-2", "Microsoft.KeyVault/vaults", Some("eastus"), Some("   ")),
            ],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"Unidentified Resources": {"eastus": {"azure_cloud": ["kv-1", "kv-2"]}}})
        );
    }

    #[test]
    fn test_single_vm_private_ip_only() {
        let snapshot = InventorySnapshot {
            virtual_machines: vec![vm("vm-1", "eastus", Some("team-payments"), &["nic-1"])],
            network_interfaces: vec![nic("nic-1", "10.0.0.5", None)],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"team-payments": {"eastus": {"azure_cloud": ["vm-1"], "ipv4": ["10.0.0.5"]}}})
        );
    }

    #[test]
    fn test_vm_public_ip_resolved_case_insensitive() {
        let snapshot = InventorySnapshot {
            virtual_machines: vec![vm("vm-1", "westeurope", Some("web"), &["/Sub/NIC-1"])],
            network_interfaces: vec![nic("/sub/nic-1", "10.1.0.4", Some("/Sub/PIP-1"))],
            public_ip_addresses: vec![PublicIpAddress {
                id: "/sub/pip-1".to_string(),
                ip_address: Some("20.50.1.2".to_string()),
            }],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(
            state.get("web", "westeurope", ContentType::Ipv4Address).unwrap(),
            &["10.1.0.4", "20.50.1.2"]
        );
    }

    #[test]
    fn test_unallocated_public_ip_and_unknown_nic_skipped() {
        let snapshot = InventorySnapshot {
            virtual_machines: vec![vm("vm-1", "eastus", Some("web"), &["nic-1", "nic-missing"])],
            network_interfaces: vec![nic("nic-1", "10.0.0.4", Some("pip-1"))],
            public_ip_addresses: vec![PublicIpAddress {
                id: "pip-1".to_string(),
                ip_address: None,
            }],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(state.get("web", "eastus", ContentType::Ipv4Address).unwrap(), &["10.0.0.4"]);
    }

    #[test]
    fn test_every_ip_configuration_checked_for_public_ip() {
        let mut multi = nic("nic-1", "10.0.0.4", Some("pip-1"));
        multi.ip_configurations.push(IpConfiguration {
            name: Some("ipconfig2".to_string()),
            properties: IpConfigurationProperties {
                private_ip_address: Some("10.0.0.5".to_string()),
                public_ip_address: None,
            },
        });
        let snapshot = InventorySnapshot {
            virtual_machines: vec![vm("vm-1", "eastus", Some("web"), &["nic-1"])],
            network_interfaces: vec![multi],
            public_ip_addresses: vec![PublicIpAddress {
                id: "pip-1".to_string(),
                ip_address: Some("20.0.0.1".to_string()),
            }],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(
            state.get("web", "eastus", ContentType::Ipv4Address).unwrap(),
            &["10.0.0.4", "20.0.0.1", "10.0.0.5"]
        );
    }

    #[test]
    fn test_duplicate_subnet_prefix_recorded_once() {
        let snapshot = InventorySnapshot {
            virtual_networks: vec![vnet(
                "vnet-1",
                "eastus",
                Some("core"),
                &["10.0.0.0/24", "10.0.0.0/24", "10.0.1.0/24"],
            )],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(
            state.get("core", "eastus", ContentType::Ipv4Address).unwrap(),
            &["10.0.0.0/24", "10.0.1.0/24"]
        );
    }

    #[test]
    fn test_prefix_dedup_scoped_to_surface_and_location() {
        let snapshot = InventorySnapshot {
            virtual_networks: vec![
                vnet("vnet-1", "eastus", Some("core"), &["10.0.0.0/24"]),
                vnet("vnet-2", "eastus", Some("core"), &["10.0.0.0/24"]),
                vnet("vnet-3", "westus", Some("core"), &["10.0.0.0/24"]),
                vnet("vnet-4", "eastus", Some("edge"), &["10.0.0.0/24"]),
            ],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(state.get("core", "eastus", ContentType::Ipv4Address).unwrap().len(), 1);
        assert_eq!(state.get("core", "westus", ContentType::Ipv4Address).unwrap().len(), 1);
        assert_eq!(state.get("edge", "eastus", ContentType::Ipv4Address).unwrap().len(), 1);
        assert_eq!(
            state.get("core", "eastus", ContentType::CloudResourceId).unwrap(),
            &["vnet-1", "vnet-2"]
        );
    }

    #[test]
    fn test_other_resources_skip_vm_and_vnet_types() {
        let snapshot = InventorySnapshot {
            resources: vec![
                resource("vm-1", "Microsoft.Compute/virtualMachines", Some("eastus"), Some("web")),
                resource("vnet-1", "microsoft.network/virtualnetworks", Some("eastus"), Some("web")),
                resource("kv-1", "Microsoft.KeyVault/vaults", Some("eastus"), Some("web")),
                resource("st-1", "Microsoft.Storage/storageAccounts", Some("eastus"), None),
            ],
            ..Default::default()
        };
        let state = intended_state_from_snapshot(&snapshot, TAG).expect("state");
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "web": {"eastus": {"azure_cloud": ["kv-1"]}},
                "Unidentified Resources": {"eastus": {"azure_cloud": ["st-1"]}}
            })
        );
    }

    #[test]
    fn test_missing_location_fails() {
        let snapshot = InventorySnapshot {
            virtual_machines: vec![vm("vm-1", "eastus", Some("web"), &[])],
            resources: vec![resource("dns-1", "Microsoft.Network/dnszones", None, Some("web"))],
            ..Default::default()
        };
        let err = intended_state_from_snapshot(&snapshot, TAG).unwrap_err();
        assert!(err.to_string().contains("dns-1"), "{err}");
    }

    #[test]
    fn test_events_are_lazy_and_ordered_by_source() {
        let snapshot = InventorySnapshot {
            virtual_machines: vec![vm("vm-1", "eastus", None, &[])],
            virtual_networks: vec![vnet("vnet-1", "eastus", None, &[])],
            resources: vec![resource("kv-1", "Microsoft.KeyVault/vaults", Some("eastus"), None)],
            ..Default::default()
        };
        let mut events = inventory_events(&snapshot, TAG);
        assert_eq!(events.next().unwrap().unwrap().identifier, "vm-1");
        assert_eq!(events.next().unwrap().unwrap().identifier, "vnet-1");
        assert_eq!(events.next().unwrap().unwrap().identifier, "kv-1");
        assert!(events.next().is_none());
    }
}
