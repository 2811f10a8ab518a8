//! Server types.

use hcloud_core::id::{LocationId, ServerTypeId};
use hcloud_core::query::ListParams;
use hcloud_core::types::{DeprecationInfo, Price};
use hcloud_core::{Resource, ResourceClient, ServiceClient};
use serde::{Deserialize, Serialize};

/// A named compute shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerType {
    /// Server type ID.
    pub id: ServerTypeId,
    /// Unique name, e.g. `cx22`.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Number of CPU cores.
    #[serde(default)]
    pub cores: u32,
    /// Memory in GB.
    #[serde(default)]
    pub memory: f64,
    /// Disk size in GB.
    #[serde(default)]
    pub disk: u64,
    /// `local` or `network`.
    #[serde(default)]
    pub storage_type: String,
    /// `shared` or `dedicated`.
    #[serde(default)]
    pub cpu_type: String,
    /// CPU architecture, `x86` or `arm`.
    #[serde(default)]
    pub architecture: String,
    /// Prices per location.
    #[serde(default)]
    pub prices: Vec<ServerTypeLocationPrice>,
    /// Deprecation across all locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<DeprecationInfo>,
    /// Locations the type is offered in, each with its own deprecation.
    #[serde(default)]
    pub locations: Vec<ServerTypeLocation>,
}

/// A location a server type is offered in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerTypeLocation {
    /// Location ID.
    pub id: LocationId,
    /// Location name, e.g. `fsn1`.
    pub name: String,
    /// Deprecation in this location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<DeprecationInfo>,
}

/// Price of a server type in one location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerTypeLocationPrice {
    /// Location name.
    pub location: String,
    /// Hourly price.
    pub price_hourly: Price,
    /// Monthly price.
    pub price_monthly: Price,
    /// Included traffic in bytes.
    #[serde(default)]
    pub included_traffic: u64,
}

impl Resource for ServerType {
    type Id = ServerTypeId;
    const SINGULAR: &'static str = "server_type";
    const PLURAL: &'static str = "server_types";
    const PATH: &'static str = "server_types";
}

/// Read-only client for server types.
#[derive(Debug, Clone)]
pub struct ServerTypeClient {
    resources: ResourceClient<ServerType>,
}

impl ServerTypeClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(ServerType, ListParams);
}
