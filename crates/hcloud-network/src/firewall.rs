//! Firewalls.

use chrono::{DateTime, Utc};
use hcloud_actions::{Action, ActionList};
use hcloud_core::id::{FirewallId, ServerId};
use hcloud_core::query::ListParams;
use hcloud_core::types::Labels;
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Direction of traffic a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallRuleDirection {
    /// Incoming traffic.
    In,
    /// Outgoing traffic.
    Out,
}

/// Protocol a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallRuleProtocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
    /// ICMP.
    Icmp,
    /// ESP.
    Esp,
    /// GRE.
    Gre,
}

impl FirewallRuleProtocol {
    /// Protocols that carry ports.
    #[must_use]
    pub fn has_ports(self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }
}

/// A single allow rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallRule {
    /// Traffic direction.
    pub direction: FirewallRuleDirection,
    /// Protocol.
    pub protocol: FirewallRuleProtocol,
    /// Port or range such as `80` or `1024-5000`, for TCP and UDP only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Source networks for incoming rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_ips: Vec<String>,
    /// Destination networks for outgoing rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_ips: Vec<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FirewallRule {
    /// Incoming rule from any address.
    #[must_use]
    pub fn allow_in(protocol: FirewallRuleProtocol, port: Option<&str>) -> Self {
        Self {
            direction: FirewallRuleDirection::In,
            protocol,
            port: port.map(str::to_string),
            source_ips: vec!["0.0.0.0/0".to_string(), "::/0".to_string()],
            destination_ips: Vec::new(),
            description: None,
        }
    }

    fn check(&self) -> Result<()> {
        if self.port.is_some() && !self.protocol.has_ports() {
            return Err(hcloud_core::Error::InvalidRequest(format!(
                "port is only allowed for tcp and udp rules, got {:?}",
                self.protocol
            )));
        }
        Ok(())
    }
}

/// Label selector naming the resources a firewall applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallLabelSelector {
    /// Selector expression.
    pub selector: String,
}

/// Server reference inside a firewall resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallServerRef {
    /// Server ID.
    pub id: ServerId,
}

/// Kind of resource a firewall is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirewallResourceType {
    /// A single server.
    Server,
    /// All servers matching a label selector.
    LabelSelector,
}

/// A resource a firewall is applied to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallResource {
    /// Resource kind.
    #[serde(rename = "type")]
    pub kind: FirewallResourceType,
    /// Server, for `server` resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<FirewallServerRef>,
    /// Selector, for `label_selector` resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<FirewallLabelSelector>,
    /// Servers currently matched by a label selector.
    #[serde(default, skip_serializing)]
    pub applied_to_resources: Vec<FirewallResource>,
}

impl FirewallResource {
    /// Reference a single server.
    #[must_use]
    pub fn server(id: ServerId) -> Self {
        Self {
            kind: FirewallResourceType::Server,
            server: Some(FirewallServerRef { id }),
            label_selector: None,
            applied_to_resources: Vec::new(),
        }
    }

    /// Reference every server matching a selector.
    #[must_use]
    pub fn label_selector(selector: impl Into<String>) -> Self {
        Self {
            kind: FirewallResourceType::LabelSelector,
            server: None,
            label_selector: Some(FirewallLabelSelector {
                selector: selector.into(),
            }),
            applied_to_resources: Vec::new(),
        }
    }
}

/// A set of allow rules applied to servers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Firewall {
    /// Firewall ID.
    pub id: FirewallId,
    /// Unique name.
    pub name: String,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Allow rules.
    #[serde(default)]
    pub rules: Vec<FirewallRule>,
    /// Resources the firewall is applied to.
    #[serde(default)]
    pub applied_to: Vec<FirewallResource>,
}

impl Resource for Firewall {
    type Id = FirewallId;
    const SINGULAR: &'static str = "firewall";
    const PLURAL: &'static str = "firewalls";
    const PATH: &'static str = "firewalls";
}

/// Request body for creating a firewall.
#[derive(Debug, Clone, Default, Serialize, Validate, PartialEq, Eq)]
pub struct FirewallCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Initial rules.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<FirewallRule>,
    /// Resources to apply the firewall to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub apply_to: Vec<FirewallResource>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Response of creating a firewall.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FirewallCreateResult {
    /// The new firewall.
    pub firewall: Firewall,
    /// Actions applying rules and resources.
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Changes to a firewall.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FirewallUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

#[derive(Serialize)]
struct SetRulesBody<'a> {
    rules: &'a [FirewallRule],
}

#[derive(Serialize)]
struct ApplyToBody<'a> {
    apply_to: &'a [FirewallResource],
}

#[derive(Serialize)]
struct RemoveFromBody<'a> {
    remove_from: &'a [FirewallResource],
}

/// Client for firewalls.
#[derive(Debug, Clone)]
pub struct FirewallClient {
    resources: ResourceClient<Firewall>,
}

impl FirewallClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Firewall, ListParams);

    /// Create a firewall.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, opts: &FirewallCreateOpts) -> Result<FirewallCreateResult> {
        opts.validate()?;
        opts.rules.iter().try_for_each(FirewallRule::check)?;
        self.resources.create(opts).await
    }

    /// Update a firewall.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: FirewallId, opts: &FirewallUpdateOpts) -> Result<Firewall> {
        self.resources.update(id, opts).await
    }

    /// Delete a firewall.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: FirewallId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Replace all rules. An empty slice removes every rule.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn set_rules(&self, id: FirewallId, rules: &[FirewallRule]) -> Result<ActionList> {
        rules.iter().try_for_each(FirewallRule::check)?;
        self.resources
            .action(id, "set_rules", Some(&SetRulesBody { rules }))
            .await
    }

    /// Apply the firewall to more resources.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn apply_to_resources(
        &self,
        id: FirewallId,
        resources: &[FirewallResource],
    ) -> Result<ActionList> {
        self.resources
            .action(
                id,
                "apply_to_resources",
                Some(&ApplyToBody {
                    apply_to: resources,
                }),
            )
            .await
    }

    /// Stop applying the firewall to resources.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn remove_from_resources(
        &self,
        id: FirewallId,
        resources: &[FirewallResource],
    ) -> Result<ActionList> {
        self.resources
            .action(
                id,
                "remove_from_resources",
                Some(&RemoveFromBody {
                    remove_from: resources,
                }),
            )
            .await
    }
}
