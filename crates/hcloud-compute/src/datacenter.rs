//! Datacenters.

use hcloud_core::id::{DatacenterId, ServerTypeId};
use hcloud_core::query::ListParams;
use hcloud_core::types::Location;
use hcloud_core::{Resource, ResourceClient, ServiceClient};
use serde::{Deserialize, Serialize};

/// A datacenter within a location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Datacenter {
    /// Datacenter ID.
    pub id: DatacenterId,
    /// Unique name, e.g. `fsn1-dc14`.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Location of the datacenter.
    pub location: Location,
    /// Server types offered in the datacenter.
    #[serde(default)]
    pub server_types: DatacenterServerTypes,
}

/// Server type availability in a datacenter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatacenterServerTypes {
    /// Types that are generally supported.
    #[serde(default)]
    pub supported: Vec<ServerTypeId>,
    /// Types that can currently be ordered.
    #[serde(default)]
    pub available: Vec<ServerTypeId>,
    /// Types existing servers can be migrated to.
    #[serde(default)]
    pub available_for_migration: Vec<ServerTypeId>,
}

impl Datacenter {
    /// Returns true if the server type can currently be ordered here.
    #[must_use]
    pub fn offers(&self, server_type: ServerTypeId) -> bool {
        self.server_types.available.contains(&server_type)
    }
}

impl Resource for Datacenter {
    type Id = DatacenterId;
    const SINGULAR: &'static str = "datacenter";
    const PLURAL: &'static str = "datacenters";
    const PATH: &'static str = "datacenters";
}

/// Read-only client for datacenters.
#[derive(Debug, Clone)]
pub struct DatacenterClient {
    resources: ResourceClient<Datacenter>,
}

impl DatacenterClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Datacenter, ListParams);
}
