//! Servers and their actions.

use chrono::{DateTime, Utc};
use hcloud_actions::{splice_actions, Action, ActionResult};
use hcloud_core::id::{
    FirewallId, FloatingIpId, ImageId, IsoId, LoadBalancerId, NetworkId, PlacementGroupId,
    PrimaryIpId, ServerId, VolumeId,
};
use hcloud_core::query::QueryParams;
use hcloud_core::types::{DnsPtr, Labels, Protection};
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::datacenter::Datacenter;
use crate::image::{Image, ImageType};
use crate::iso::Iso;
use crate::placement_group::PlacementGroup;
use crate::server_type::ServerType;

/// Lifecycle status of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Powered on.
    Running,
    /// Being created.
    Initializing,
    /// Powering on.
    Starting,
    /// Powering off.
    Stopping,
    /// Powered off.
    Off,
    /// Being deleted.
    Deleting,
    /// Being migrated to another host.
    Migrating,
    /// Being rebuilt.
    Rebuilding,
    /// A status this crate does not know.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Initializing => "initializing",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Off => "off",
            Self::Deleting => "deleting",
            Self::Migrating => "migrating",
            Self::Rebuilding => "rebuilding",
            Self::Unknown => "unknown",
        })
    }
}

/// Public IPv4 address of a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerPublicIpv4 {
    /// Primary IP ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PrimaryIpId>,
    /// Address.
    pub ip: String,
    /// Address is blocked for abuse.
    #[serde(default)]
    pub blocked: bool,
    /// Reverse DNS hostname.
    #[serde(default)]
    pub dns_ptr: String,
}

/// Public IPv6 network of a server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerPublicIpv6 {
    /// Primary IP ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PrimaryIpId>,
    /// Network in CIDR notation.
    pub ip: String,
    /// Network is blocked for abuse.
    #[serde(default)]
    pub blocked: bool,
    /// Reverse DNS entries.
    #[serde(default)]
    pub dns_ptr: Vec<DnsPtr>,
}

/// Firewall applied to a server's public interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerFirewallStatus {
    /// Firewall ID.
    pub id: FirewallId,
    /// `applied` or `pending`.
    pub status: String,
}

/// Public network configuration of a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerPublicNet {
    /// IPv4 address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<ServerPublicIpv4>,
    /// IPv6 network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<ServerPublicIpv6>,
    /// Floating IPs assigned to the server.
    #[serde(default)]
    pub floating_ips: Vec<FloatingIpId>,
    /// Firewalls applied to the server.
    #[serde(default)]
    pub firewalls: Vec<ServerFirewallStatus>,
}

/// Attachment of a server to a private network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerPrivateNet {
    /// Network ID.
    pub network: NetworkId,
    /// Primary private IP.
    pub ip: String,
    /// Additional private IPs.
    #[serde(default)]
    pub alias_ips: Vec<String>,
    /// MAC address of the interface.
    #[serde(default)]
    pub mac_address: String,
}

/// A virtual server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    /// Server ID.
    pub id: ServerId,
    /// Unique name.
    pub name: String,
    /// Lifecycle status.
    pub status: ServerStatus,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Public network configuration.
    #[serde(default)]
    pub public_net: ServerPublicNet,
    /// Private network attachments.
    #[serde(default)]
    pub private_net: Vec<ServerPrivateNet>,
    /// Server type.
    pub server_type: ServerType,
    /// Datacenter the server runs in.
    pub datacenter: Datacenter,
    /// Image the server was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Attached ISO.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<Iso>,
    /// Rescue mode is enabled for the next boot.
    #[serde(default)]
    pub rescue_enabled: bool,
    /// Server is locked by a running action.
    #[serde(default)]
    pub locked: bool,
    /// Backup window, if backups are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_window: Option<String>,
    /// Outgoing traffic in the current billing period, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_traffic: Option<u64>,
    /// Incoming traffic in the current billing period, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingoing_traffic: Option<u64>,
    /// Free traffic in the current billing period, in bytes.
    #[serde(default)]
    pub included_traffic: u64,
    /// Protection flags.
    #[serde(default)]
    pub protection: Protection,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Attached volumes.
    #[serde(default)]
    pub volumes: Vec<VolumeId>,
    /// Load balancers targeting the server.
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerId>,
    /// Size of the primary disk in GB.
    #[serde(default)]
    pub primary_disk_size: u64,
    /// Placement group the server belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_group: Option<PlacementGroup>,
}

impl Server {
    /// Private network attachment for `network`, if attached.
    #[must_use]
    pub fn private_net_for(&self, network: NetworkId) -> Option<&ServerPrivateNet> {
        self.private_net.iter().find(|net| net.network == network)
    }
}

impl Resource for Server {
    type Id = ServerId;
    const SINGULAR: &'static str = "server";
    const PLURAL: &'static str = "servers";
    const PATH: &'static str = "servers";
}

/// Filters supported by the `/servers` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServerListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by status.
    pub statuses: Vec<ServerStatus>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl ServerListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_all("status", &self.statuses);
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}

/// Firewall to apply when creating a server.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ServerCreateFirewall {
    /// Firewall ID.
    pub firewall: FirewallId,
}

/// Public network settings for a new server.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServerCreatePublicNet {
    /// Attach a public IPv4 address.
    pub enable_ipv4: bool,
    /// Attach a public IPv6 network.
    pub enable_ipv6: bool,
    /// Use this existing primary IPv4 address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<PrimaryIpId>,
    /// Use this existing primary IPv6 network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<PrimaryIpId>,
}

/// Request body for creating a server.
///
/// Server type, image, location and datacenter accept an ID or a name.
#[derive(Debug, Clone, Default, Serialize, Validate, PartialEq, Eq)]
pub struct ServerCreateOpts {
    /// Unique name, a valid hostname.
    #[validate(length(min = 1, max = 63))]
    pub name: String,
    /// Server type ID or name.
    #[validate(length(min = 1))]
    pub server_type: String,
    /// Image ID or name.
    #[validate(length(min = 1))]
    pub image: String,
    /// Location ID or name; mutually exclusive with `datacenter`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Datacenter ID or name; mutually exclusive with `location`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    /// SSH key IDs or names to inject.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<String>,
    /// Cloud-init user data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Power on once created; defaults to true server-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_after_create: Option<bool>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    /// Mount attached volumes automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automount: Option<bool>,
    /// Volumes to attach.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeId>,
    /// Networks to attach.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<NetworkId>,
    /// Firewalls to apply.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub firewalls: Vec<ServerCreateFirewall>,
    /// Placement group to join.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_group: Option<PlacementGroupId>,
    /// Public network settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_net: Option<ServerCreatePublicNet>,
}

/// Response of creating a server.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerCreateResult {
    /// The new server.
    pub server: Server,
    /// The create action.
    pub action: Action,
    /// Follow-up actions, e.g. starting the server or attaching networks.
    #[serde(default)]
    pub next_actions: Vec<Action>,
    /// Root password when no SSH key was given.
    #[serde(default)]
    pub root_password: Option<String>,
}

impl ServerCreateResult {
    /// Every action started by the creation, primary action first.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        splice_actions(self.action.clone(), self.next_actions.clone())
    }
}

/// Changes to a server.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ServerUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Response of actions that generate a root password.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerPasswordResult {
    /// The started action.
    pub action: Action,
    /// The new root password.
    #[serde(default)]
    pub root_password: Option<String>,
}

/// Response of creating an image from a server.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerCreateImageResult {
    /// The new image.
    pub image: Image,
    /// The started action.
    pub action: Action,
}

/// Response of requesting a VNC console.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConsoleResult {
    /// WebSocket URL of the console.
    pub wss_url: String,
    /// VNC password.
    pub password: String,
    /// The started action.
    pub action: Action,
}

/// Options for creating an image from a server.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ServerCreateImageOpts {
    /// Image description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `snapshot` or `backup`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ImageType>,
    /// Labels of the new image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Options for enabling rescue mode.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ServerEnableRescueOpts {
    /// Rescue system, `linux64`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// SSH key IDs to inject into the rescue system.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<i64>,
}

/// Options for attaching a server to a network.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServerAttachToNetworkOpts {
    /// Network to attach to.
    pub network: NetworkId,
    /// Requested private IP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Additional private IPs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias_ips: Vec<String>,
}

/// Protection flags to change; unset flags are left alone.
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ServerChangeProtectionOpts {
    /// Delete protection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
    /// Rebuild protection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rebuild: Option<bool>,
}

#[derive(Serialize)]
struct RebuildBody<'a> {
    image: &'a str,
}

#[derive(Serialize)]
struct AttachIsoBody<'a> {
    iso: &'a str,
}

#[derive(Serialize)]
struct ChangeTypeBody<'a> {
    server_type: &'a str,
    upgrade_disk: bool,
}

#[derive(Serialize)]
struct NetworkBody {
    network: NetworkId,
}

#[derive(Serialize)]
struct AliasIpsBody<'a> {
    network: NetworkId,
    alias_ips: &'a [String],
}

#[derive(Serialize)]
struct DnsPtrBody<'a> {
    ip: &'a str,
    dns_ptr: Option<&'a str>,
}

#[derive(Serialize)]
struct PlacementGroupBody {
    placement_group: PlacementGroupId,
}

/// Client for servers.
#[derive(Debug, Clone)]
pub struct ServerClient {
    resources: ResourceClient<Server>,
}

impl ServerClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Server, ServerListParams);

    /// Create a server.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, opts: &ServerCreateOpts) -> Result<ServerCreateResult> {
        opts.validate()?;
        debug!(name = %opts.name, server_type = %opts.server_type, "creating server");
        self.resources.create(opts).await
    }

    /// Update a server.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: ServerId, opts: &ServerUpdateOpts) -> Result<Server> {
        self.resources.update(id, opts).await
    }

    /// Delete a server.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn delete(&self, id: ServerId) -> Result<ActionResult> {
        self.resources.delete_returning(id).await
    }

    async fn simple_action(&self, id: ServerId, name: &str) -> Result<ActionResult> {
        self.resources.action::<(), _>(id, name, None).await
    }

    /// Power on.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn power_on(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "poweron").await
    }

    /// Cut power.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn power_off(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "poweroff").await
    }

    /// Soft reboot via ACPI.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn reboot(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "reboot").await
    }

    /// Hard reset.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn reset(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "reset").await
    }

    /// Graceful shutdown via ACPI.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn shutdown(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "shutdown").await
    }

    /// Reset the root password.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn reset_password(&self, id: ServerId) -> Result<ServerPasswordResult> {
        self.resources
            .action::<(), _>(id, "reset_password", None)
            .await
    }

    /// Rebuild from an image ID or name.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn rebuild(&self, id: ServerId, image: &str) -> Result<ServerPasswordResult> {
        self.resources
            .action(id, "rebuild", Some(&RebuildBody { image }))
            .await
    }

    /// Create a snapshot or backup image of the server's disk.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn create_image(
        &self,
        id: ServerId,
        opts: &ServerCreateImageOpts,
    ) -> Result<ServerCreateImageResult> {
        self.resources.action(id, "create_image", Some(opts)).await
    }

    /// Boot into the rescue system on next start.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn enable_rescue(
        &self,
        id: ServerId,
        opts: &ServerEnableRescueOpts,
    ) -> Result<ServerPasswordResult> {
        self.resources.action(id, "enable_rescue", Some(opts)).await
    }

    /// Disable the rescue system.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn disable_rescue(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "disable_rescue").await
    }

    /// Attach an ISO by ID or name.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn attach_iso(&self, id: ServerId, iso: &str) -> Result<ActionResult> {
        self.resources
            .action(id, "attach_iso", Some(&AttachIsoBody { iso }))
            .await
    }

    /// Attach an ISO by ID.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn attach_iso_by_id(&self, id: ServerId, iso: IsoId) -> Result<ActionResult> {
        self.attach_iso(id, &iso.to_string()).await
    }

    /// Detach the attached ISO.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn detach_iso(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "detach_iso").await
    }

    /// Change the server type; the server must be powered off.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_type(
        &self,
        id: ServerId,
        server_type: &str,
        upgrade_disk: bool,
    ) -> Result<ActionResult> {
        let body = ChangeTypeBody {
            server_type,
            upgrade_disk,
        };
        self.resources.action(id, "change_type", Some(&body)).await
    }

    /// Enable automatic backups.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn enable_backup(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "enable_backup").await
    }

    /// Disable automatic backups and delete existing ones.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn disable_backup(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "disable_backup").await
    }

    /// Attach to a private network.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn attach_to_network(
        &self,
        id: ServerId,
        opts: &ServerAttachToNetworkOpts,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "attach_to_network", Some(opts))
            .await
    }

    /// Detach from a private network.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn detach_from_network(
        &self,
        id: ServerId,
        network: NetworkId,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "detach_from_network", Some(&NetworkBody { network }))
            .await
    }

    /// Replace the alias IPs in a network.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_alias_ips(
        &self,
        id: ServerId,
        network: NetworkId,
        alias_ips: &[String],
    ) -> Result<ActionResult> {
        let body = AliasIpsBody { network, alias_ips };
        self.resources
            .action(id, "change_alias_ips", Some(&body))
            .await
    }

    /// Change delete and rebuild protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(
        &self,
        id: ServerId,
        opts: ServerChangeProtectionOpts,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&opts))
            .await
    }

    /// Set or reset (`None`) the reverse DNS entry of a public IP.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_dns_ptr(
        &self,
        id: ServerId,
        ip: &str,
        dns_ptr: Option<&str>,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "change_dns_ptr", Some(&DnsPtrBody { ip, dns_ptr }))
            .await
    }

    /// Add to a placement group; the server must be powered off.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn add_to_placement_group(
        &self,
        id: ServerId,
        placement_group: PlacementGroupId,
    ) -> Result<ActionResult> {
        let body = PlacementGroupBody { placement_group };
        self.resources
            .action(id, "add_to_placement_group", Some(&body))
            .await
    }

    /// Remove from its placement group.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn remove_from_placement_group(&self, id: ServerId) -> Result<ActionResult> {
        self.simple_action(id, "remove_from_placement_group").await
    }

    /// Request credentials for a VNC console.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn request_console(&self, id: ServerId) -> Result<ServerConsoleResult> {
        self.resources
            .action::<(), _>(id, "request_console", None)
            .await
    }

    /// Rebuild from an image ID.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn rebuild_from_image(
        &self,
        id: ServerId,
        image: ImageId,
    ) -> Result<ServerPasswordResult> {
        self.rebuild(id, &image.to_string()).await
    }
}
