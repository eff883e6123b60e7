//! Domain models for the protect surface sync.
//!
//! - [`ContentType`] - the kinds of identifiers stored per location
//! - [`InventorySnapshot`] and friends - Azure Resource Graph records
//! - [`IntendedState`] - what AUXO should contain after a run
//! - [`RemoteStateRecord`] and [`RemoteStateIndex`] - what AUXO contains now
//! - [`ProtectSurfaceLocationState`] - upsert payload
//! - [`coords_for`] - region geocoding

mod content;
mod intended_state;
mod inventory;
mod location;
mod payload;
mod remote;

// Re-export public types
pub use content::ContentType;
pub use intended_state::{IntendedState, LocationContents, SurfaceLocations};
pub use inventory::{
    GenericResource, InventorySnapshot, IpConfiguration, IpConfigurationProperties,
    NetworkInterface, PublicIpAddress, ResourceRef, Subnet, SubnetProperties, TaggedResource,
    Tags, VirtualMachine, VirtualNetwork, VIRTUAL_MACHINE_TYPE, VIRTUAL_NETWORK_TYPE,
};
pub use location::{coords_for, LocationCoords, DEFAULT_COORDS, REGION_COORDS};
pub use payload::{
    location_uniqueness_key, surface_uniqueness_key, ProtectSurfaceLocationState, StateContent,
    UpsertRequest, PROTECT_SURFACE_RELEVANCE,
};
pub use remote::{
    ProtectSurfaceResponse, ProtectSurfaceSummary, RemoteStateIndex, RemoteStateRecord,
    StatesResponse,
};
