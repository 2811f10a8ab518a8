//! Primary IPs.

use chrono::{DateTime, Utc};
use hcloud_actions::{Action, ActionResult};
use hcloud_core::id::{DatacenterId, PrimaryIpId};
use hcloud_core::query::QueryParams;
use hcloud_core::types::{DnsPtr, Labels, Location, Protection};
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::{ChangeProtectionBody, DnsPtrBody, IpType};

/// Datacenter a primary IP is bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrimaryIpDatacenter {
    /// Datacenter ID.
    pub id: DatacenterId,
    /// Datacenter name.
    pub name: String,
    /// Location of the datacenter.
    pub location: Location,
}

/// An IP that is the public address of a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrimaryIp {
    /// Primary IP ID.
    pub id: PrimaryIpId,
    /// Unique name.
    pub name: String,
    /// Address, or network for IPv6.
    pub ip: String,
    /// Address family.
    #[serde(rename = "type")]
    pub kind: IpType,
    /// ID of the resource the IP is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    /// Kind of assignee, `server`.
    #[serde(default)]
    pub assignee_type: String,
    /// Delete the IP when its assignee is deleted.
    #[serde(default)]
    pub auto_delete: bool,
    /// Address is blocked for abuse.
    #[serde(default)]
    pub blocked: bool,
    /// Datacenter the IP is bound to.
    pub datacenter: PrimaryIpDatacenter,
    /// Reverse DNS entries.
    #[serde(default)]
    pub dns_ptr: Vec<DnsPtr>,
    /// Protection flags.
    #[serde(default)]
    pub protection: Protection,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Resource for PrimaryIp {
    type Id = PrimaryIpId;
    const SINGULAR: &'static str = "primary_ip";
    const PLURAL: &'static str = "primary_ips";
    const PATH: &'static str = "primary_ips";
}

/// Filters supported by the `/primary_ips` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrimaryIpListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by address.
    pub ip: Option<String>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl PrimaryIpListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_opt("ip", self.ip.as_deref());
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}

/// Request body for creating a primary IP.
///
/// Either `assignee_id` or `datacenter` must be set.
#[derive(Debug, Clone, Serialize, Validate, PartialEq, Eq)]
pub struct PrimaryIpCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Address family.
    #[serde(rename = "type")]
    pub kind: IpType,
    /// Kind of assignee, `server`.
    pub assignee_type: String,
    /// Assign to this resource right away.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    /// Datacenter name for an unassigned IP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    /// Delete the IP when its assignee is deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Response of creating a primary IP.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PrimaryIpCreateResult {
    /// The new primary IP.
    pub primary_ip: PrimaryIp,
    /// Assignment action when an assignee was given.
    #[serde(default)]
    pub action: Option<Action>,
}

/// Changes to a primary IP.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct PrimaryIpUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Delete the IP when its assignee is deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

#[derive(Serialize)]
struct AssignBody<'a> {
    assignee_id: i64,
    assignee_type: &'a str,
}

/// Client for primary IPs.
#[derive(Debug, Clone)]
pub struct PrimaryIpClient {
    resources: ResourceClient<PrimaryIp>,
}

impl PrimaryIpClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(PrimaryIp, PrimaryIpListParams);

    /// Fetch a primary IP by address.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get_by_ip(&self, ip: &str) -> Result<Option<PrimaryIp>> {
        let params = PrimaryIpListParams {
            ip: Some(ip.to_string()),
            ..PrimaryIpListParams::default()
        };
        let (ips, _) = self
            .list(&hcloud_core::ListOpts::default(), &params)
            .await?;
        Ok(ips.into_iter().next())
    }

    /// Create a primary IP.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, opts: &PrimaryIpCreateOpts) -> Result<PrimaryIpCreateResult> {
        opts.validate()?;
        if opts.assignee_id.is_none() && opts.datacenter.is_none() {
            return Err(hcloud_core::Error::InvalidRequest(
                "primary IP needs an assignee or a datacenter".to_string(),
            ));
        }
        self.resources.create(opts).await
    }

    /// Update a primary IP.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: PrimaryIpId, opts: &PrimaryIpUpdateOpts) -> Result<PrimaryIp> {
        self.resources.update(id, opts).await
    }

    /// Delete a primary IP.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: PrimaryIpId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Assign to a server; the server must be powered off.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn assign(&self, id: PrimaryIpId, server_id: i64) -> Result<ActionResult> {
        let body = AssignBody {
            assignee_id: server_id,
            assignee_type: "server",
        };
        self.resources.action(id, "assign", Some(&body)).await
    }

    /// Unassign from its server.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn unassign(&self, id: PrimaryIpId) -> Result<ActionResult> {
        self.resources.action::<(), _>(id, "unassign", None).await
    }

    /// Set or reset (`None`) the reverse DNS entry of an address.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_dns_ptr(
        &self,
        id: PrimaryIpId,
        ip: &str,
        dns_ptr: Option<&str>,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "change_dns_ptr", Some(&DnsPtrBody { ip, dns_ptr }))
            .await
    }

    /// Enable or disable delete protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(&self, id: PrimaryIpId, delete: bool) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&ChangeProtectionBody { delete }))
            .await
    }
}
