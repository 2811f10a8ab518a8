//! Load balancers with their services and targets.

use chrono::{DateTime, Utc};
use hcloud_actions::{Action, ActionResult};
use hcloud_core::id::{CertificateId, LoadBalancerId, NetworkId, ServerId};
use hcloud_core::query::ListParams;
use hcloud_core::types::{Labels, Location, Protection};
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::common::{ChangeProtectionBody, DnsPtrBody, NetworkBody};
use crate::load_balancer_type::LoadBalancerType;

/// Distribution of requests across targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerAlgorithmType {
    /// Rotate through targets.
    #[default]
    RoundRobin,
    /// Prefer the target with the fewest open connections.
    LeastConnections,
}

/// Algorithm wrapper as it appears on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerAlgorithm {
    /// Algorithm kind.
    #[serde(rename = "type")]
    pub kind: LoadBalancerAlgorithmType,
}

/// Protocol of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancerServiceProtocol {
    /// Plain TCP.
    Tcp,
    /// HTTP.
    Http,
    /// HTTPS with TLS termination.
    Https,
}

/// HTTP settings of a health check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerHealthCheckHttp {
    /// Host header to send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Request path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Expected response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Accepted status codes, wildcards allowed (`2??`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_codes: Vec<String>,
    /// Use TLS for the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
}

/// Health check of a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerHealthCheck {
    /// Protocol used for the check.
    pub protocol: LoadBalancerServiceProtocol,
    /// Port on the target.
    pub port: u16,
    /// Seconds between checks.
    pub interval: u32,
    /// Seconds until a check times out.
    pub timeout: u32,
    /// Failed checks until a target is unhealthy.
    pub retries: u32,
    /// HTTP settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<LoadBalancerHealthCheckHttp>,
}

/// HTTP settings of a service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerServiceHttp {
    /// Sticky session cookie name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_name: Option<String>,
    /// Sticky session cookie lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_lifetime: Option<u32>,
    /// Certificates for HTTPS services.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<CertificateId>,
    /// Redirect HTTP to HTTPS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_http: Option<bool>,
    /// Enable sticky sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky_sessions: Option<bool>,
}

/// A listening service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerService {
    /// Protocol.
    pub protocol: LoadBalancerServiceProtocol,
    /// Port the load balancer listens on; identifies the service.
    pub listen_port: u16,
    /// Port traffic is forwarded to.
    pub destination_port: u16,
    /// Prepend the PROXY protocol header.
    #[serde(default)]
    pub proxyprotocol: bool,
    /// Health check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<LoadBalancerHealthCheck>,
    /// HTTP settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<LoadBalancerServiceHttp>,
}

/// Changes to an existing service, addressed by its listen port.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LoadBalancerUpdateServiceOpts {
    /// Listen port of the service to change.
    pub listen_port: u16,
    /// New protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<LoadBalancerServiceProtocol>,
    /// New destination port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<u16>,
    /// Toggle the PROXY protocol.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxyprotocol: Option<bool>,
    /// Replace the health check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<LoadBalancerHealthCheck>,
    /// Replace HTTP settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<LoadBalancerServiceHttp>,
}

/// Kind of target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerTargetType {
    /// A single server.
    Server,
    /// All servers matching a selector.
    LabelSelector,
    /// An arbitrary IP address.
    Ip,
}

/// Server of a target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerTargetServer {
    /// Server ID.
    pub id: ServerId,
}

/// Selector of a target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerTargetLabelSelector {
    /// Selector expression.
    pub selector: String,
}

/// Address of a target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerTargetIp {
    /// IP address.
    pub ip: String,
}

/// Health of a target for one service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerTargetHealthStatus {
    /// Listen port of the service.
    pub listen_port: u16,
    /// `healthy`, `unhealthy` or `unknown`.
    pub status: String,
}

/// A target receiving traffic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerTarget {
    /// Target kind.
    #[serde(rename = "type")]
    pub kind: LoadBalancerTargetType,
    /// Server, for `server` targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<LoadBalancerTargetServer>,
    /// Selector, for `label_selector` targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LoadBalancerTargetLabelSelector>,
    /// Address, for `ip` targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<LoadBalancerTargetIp>,
    /// Route through the private network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_private_ip: Option<bool>,
    /// Health per service.
    #[serde(default, skip_serializing)]
    pub health_status: Vec<LoadBalancerTargetHealthStatus>,
    /// Servers matched by a selector target.
    #[serde(default, skip_serializing)]
    pub targets: Vec<LoadBalancerTarget>,
}

impl LoadBalancerTarget {
    /// Target a single server.
    #[must_use]
    pub fn server(id: ServerId, use_private_ip: bool) -> Self {
        Self {
            server: Some(LoadBalancerTargetServer { id }),
            use_private_ip: Some(use_private_ip),
            ..Self::empty(LoadBalancerTargetType::Server)
        }
    }

    /// Target every server matching a selector.
    #[must_use]
    pub fn label_selector(selector: impl Into<String>, use_private_ip: bool) -> Self {
        Self {
            label_selector: Some(LoadBalancerTargetLabelSelector {
                selector: selector.into(),
            }),
            use_private_ip: Some(use_private_ip),
            ..Self::empty(LoadBalancerTargetType::LabelSelector)
        }
    }

    /// Target an IP address.
    #[must_use]
    pub fn ip(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(LoadBalancerTargetIp { ip: ip.into() }),
            ..Self::empty(LoadBalancerTargetType::Ip)
        }
    }

    fn empty(kind: LoadBalancerTargetType) -> Self {
        Self {
            kind,
            server: None,
            label_selector: None,
            ip: None,
            use_private_ip: None,
            health_status: Vec::new(),
            targets: Vec::new(),
        }
    }
}

/// A public address of a load balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerPublicAddress {
    /// Address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Reverse DNS entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_ptr: Option<String>,
}

/// Public interface of a load balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerPublicNet {
    /// Interface is enabled.
    pub enabled: bool,
    /// IPv4 address.
    pub ipv4: LoadBalancerPublicAddress,
    /// IPv6 address.
    pub ipv6: LoadBalancerPublicAddress,
}

/// Attachment to a private network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerPrivateNet {
    /// Network ID.
    pub network: NetworkId,
    /// Address inside the network.
    pub ip: String,
}

/// A managed load balancer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadBalancer {
    /// Load balancer ID.
    pub id: LoadBalancerId,
    /// Unique name.
    pub name: String,
    /// Public interface.
    pub public_net: LoadBalancerPublicNet,
    /// Private network attachments.
    #[serde(default)]
    pub private_net: Vec<LoadBalancerPrivateNet>,
    /// Location.
    pub location: Location,
    /// Size.
    pub load_balancer_type: LoadBalancerType,
    /// Protection flags.
    #[serde(default)]
    pub protection: Protection,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Services.
    #[serde(default)]
    pub services: Vec<LoadBalancerService>,
    /// Targets.
    #[serde(default)]
    pub targets: Vec<LoadBalancerTarget>,
    /// Algorithm.
    #[serde(default)]
    pub algorithm: LoadBalancerAlgorithm,
    /// Outgoing traffic in bytes this billing period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_traffic: Option<u64>,
    /// Ingoing traffic in bytes this billing period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingoing_traffic: Option<u64>,
    /// Included traffic in bytes.
    #[serde(default)]
    pub included_traffic: u64,
}

impl LoadBalancer {
    /// The service listening on a port.
    #[must_use]
    pub fn service(&self, listen_port: u16) -> Option<&LoadBalancerService> {
        self.services.iter().find(|s| s.listen_port == listen_port)
    }

    /// Address inside a network, if attached.
    #[must_use]
    pub fn private_ip(&self, network: NetworkId) -> Option<&str> {
        self.private_net
            .iter()
            .find(|net| net.network == network)
            .map(|net| net.ip.as_str())
    }
}

impl Resource for LoadBalancer {
    type Id = LoadBalancerId;
    const SINGULAR: &'static str = "load_balancer";
    const PLURAL: &'static str = "load_balancers";
    const PATH: &'static str = "load_balancers";
}

/// Request body for creating a load balancer.
#[derive(Debug, Clone, Default, Serialize, Validate, PartialEq, Eq)]
pub struct LoadBalancerCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Type name or ID.
    #[validate(length(min = 1))]
    pub load_balancer_type: String,
    /// Algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<LoadBalancerAlgorithm>,
    /// Location name; mutually exclusive with `network_zone`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Network zone; mutually exclusive with `location`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_zone: Option<String>,
    /// Enable the public interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_interface: Option<bool>,
    /// Network to attach to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkId>,
    /// Initial services.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<LoadBalancerService>,
    /// Initial targets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<LoadBalancerTarget>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Response of creating a load balancer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoadBalancerCreateResult {
    /// The new load balancer.
    pub load_balancer: LoadBalancer,
    /// Provisioning action.
    pub action: Action,
}

/// Changes to a load balancer.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct LoadBalancerUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Options for attaching to a network.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadBalancerAttachToNetworkOpts {
    /// Network to attach to.
    pub network: NetworkId,
    /// Requested address; assigned by the API when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Serialize)]
struct ListenPortBody {
    listen_port: u16,
}

#[derive(Serialize)]
struct ChangeTypeBody<'a> {
    load_balancer_type: &'a str,
}

/// Client for load balancers.
#[derive(Debug, Clone)]
pub struct LoadBalancerClient {
    resources: ResourceClient<LoadBalancer>,
}

impl LoadBalancerClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(LoadBalancer, ListParams);

    /// Create a load balancer.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors. Setting both `location` and
    /// `network_zone` is an [`hcloud_core::Error::InvalidRequest`].
    pub async fn create(&self, opts: &LoadBalancerCreateOpts) -> Result<LoadBalancerCreateResult> {
        opts.validate()?;
        if opts.location.is_some() && opts.network_zone.is_some() {
            return Err(hcloud_core::Error::InvalidRequest(
                "location and network_zone are mutually exclusive".to_string(),
            ));
        }
        let result: LoadBalancerCreateResult = self.resources.create(opts).await?;
        debug!(
            load_balancer = %result.load_balancer.id,
            action = %result.action.id,
            "load balancer created"
        );
        Ok(result)
    }

    /// Update a load balancer.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(
        &self,
        id: LoadBalancerId,
        opts: &LoadBalancerUpdateOpts,
    ) -> Result<LoadBalancer> {
        self.resources.update(id, opts).await
    }

    /// Delete a load balancer.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: LoadBalancerId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Add a target.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn add_target(
        &self,
        id: LoadBalancerId,
        target: &LoadBalancerTarget,
    ) -> Result<ActionResult> {
        self.resources.action(id, "add_target", Some(target)).await
    }

    /// Remove a target.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn remove_target(
        &self,
        id: LoadBalancerId,
        target: &LoadBalancerTarget,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "remove_target", Some(target))
            .await
    }

    /// Add a service.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn add_service(
        &self,
        id: LoadBalancerId,
        service: &LoadBalancerService,
    ) -> Result<ActionResult> {
        self.resources.action(id, "add_service", Some(service)).await
    }

    /// Change the service listening on `opts.listen_port`.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update_service(
        &self,
        id: LoadBalancerId,
        opts: &LoadBalancerUpdateServiceOpts,
    ) -> Result<ActionResult> {
        self.resources.action(id, "update_service", Some(opts)).await
    }

    /// Delete the service listening on a port.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn delete_service(&self, id: LoadBalancerId, listen_port: u16) -> Result<ActionResult> {
        self.resources
            .action(id, "delete_service", Some(&ListenPortBody { listen_port }))
            .await
    }

    /// Change the algorithm.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_algorithm(
        &self,
        id: LoadBalancerId,
        kind: LoadBalancerAlgorithmType,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "change_algorithm", Some(&LoadBalancerAlgorithm { kind }))
            .await
    }

    /// Change the size.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_type(
        &self,
        id: LoadBalancerId,
        load_balancer_type: &str,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "change_type", Some(&ChangeTypeBody { load_balancer_type }))
            .await
    }

    /// Attach to a private network.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn attach_to_network(
        &self,
        id: LoadBalancerId,
        opts: &LoadBalancerAttachToNetworkOpts,
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
        id: LoadBalancerId,
        network: NetworkId,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "detach_from_network", Some(&NetworkBody { network }))
            .await
    }

    /// Enable the public interface.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn enable_public_interface(&self, id: LoadBalancerId) -> Result<ActionResult> {
        self.resources
            .action::<(), _>(id, "enable_public_interface", None)
            .await
    }

    /// Disable the public interface.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn disable_public_interface(&self, id: LoadBalancerId) -> Result<ActionResult> {
        self.resources
            .action::<(), _>(id, "disable_public_interface", None)
            .await
    }

    /// Enable or disable delete protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(&self, id: LoadBalancerId, delete: bool) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&ChangeProtectionBody { delete }))
            .await
    }

    /// Set or reset (`None`) the reverse DNS entry of a public address.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_dns_ptr(
        &self,
        id: LoadBalancerId,
        ip: &str,
        dns_ptr: Option<&str>,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "change_dns_ptr", Some(&DnsPtrBody { ip, dns_ptr }))
            .await
    }
}
