//! Private networks.

use chrono::{DateTime, Utc};
use hcloud_actions::ActionResult;
use hcloud_core::id::{LoadBalancerId, NetworkId, ServerId};
use hcloud_core::query::ListParams;
use hcloud_core::types::{Labels, Protection};
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::ChangeProtectionBody;

/// Kind of subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkSubnetType {
    /// Subnet for cloud resources.
    Cloud,
    /// Legacy name for cloud subnets.
    Server,
    /// Subnet connected to a Robot vSwitch.
    Vswitch,
}

/// A subnet of a network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkSubnet {
    /// Subnet kind.
    #[serde(rename = "type")]
    pub kind: NetworkSubnetType,
    /// Range in CIDR notation; chosen by the API when omitted on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_range: Option<String>,
    /// Network zone, e.g. `eu-central`.
    pub network_zone: String,
    /// Gateway of the subnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// vSwitch ID for `vswitch` subnets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vswitch_id: Option<i64>,
}

/// A static route of a network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkRoute {
    /// Destination network in CIDR notation.
    pub destination: String,
    /// Gateway inside the network.
    pub gateway: String,
}

/// A private network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Network {
    /// Network ID.
    pub id: NetworkId,
    /// Unique name.
    pub name: String,
    /// Range in CIDR notation.
    pub ip_range: String,
    /// Subnets.
    #[serde(default)]
    pub subnets: Vec<NetworkSubnet>,
    /// Static routes.
    #[serde(default)]
    pub routes: Vec<NetworkRoute>,
    /// Attached servers.
    #[serde(default)]
    pub servers: Vec<ServerId>,
    /// Attached load balancers.
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerId>,
    /// Protection flags.
    #[serde(default)]
    pub protection: Protection,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Routes are exported to connected vSwitches.
    #[serde(default)]
    pub expose_routes_to_vswitch: bool,
}

impl Resource for Network {
    type Id = NetworkId;
    const SINGULAR: &'static str = "network";
    const PLURAL: &'static str = "networks";
    const PATH: &'static str = "networks";
}

/// Request body for creating a network.
#[derive(Debug, Clone, Default, Serialize, Validate, PartialEq, Eq)]
pub struct NetworkCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Range in CIDR notation.
    #[validate(length(min = 1))]
    pub ip_range: String,
    /// Initial subnets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<NetworkSubnet>,
    /// Initial routes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<NetworkRoute>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    /// Export routes to connected vSwitches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose_routes_to_vswitch: Option<bool>,
}

/// Changes to a network.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct NetworkUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    /// Export routes to connected vSwitches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose_routes_to_vswitch: Option<bool>,
}

#[derive(Serialize)]
struct IpRangeBody<'a> {
    ip_range: &'a str,
}

/// Client for networks.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    resources: ResourceClient<Network>,
}

impl NetworkClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Network, ListParams);

    /// Create a network.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, opts: &NetworkCreateOpts) -> Result<Network> {
        opts.validate()?;
        self.resources.create_item(opts).await
    }

    /// Update a network.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: NetworkId, opts: &NetworkUpdateOpts) -> Result<Network> {
        self.resources.update(id, opts).await
    }

    /// Delete a network.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: NetworkId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Add a subnet.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn add_subnet(&self, id: NetworkId, subnet: &NetworkSubnet) -> Result<ActionResult> {
        self.resources.action(id, "add_subnet", Some(subnet)).await
    }

    /// Delete the subnet with the given range.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn delete_subnet(&self, id: NetworkId, ip_range: &str) -> Result<ActionResult> {
        self.resources
            .action(id, "delete_subnet", Some(&IpRangeBody { ip_range }))
            .await
    }

    /// Add a static route.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn add_route(&self, id: NetworkId, route: &NetworkRoute) -> Result<ActionResult> {
        self.resources.action(id, "add_route", Some(route)).await
    }

    /// Delete a static route.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn delete_route(&self, id: NetworkId, route: &NetworkRoute) -> Result<ActionResult> {
        self.resources.action(id, "delete_route", Some(route)).await
    }

    /// Extend the network's range.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_ip_range(&self, id: NetworkId, ip_range: &str) -> Result<ActionResult> {
        self.resources
            .action(id, "change_ip_range", Some(&IpRangeBody { ip_range }))
            .await
    }

    /// Enable or disable delete protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(&self, id: NetworkId, delete: bool) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&ChangeProtectionBody { delete }))
            .await
    }
}
