//! Floating IPs.

use chrono::{DateTime, Utc};
use hcloud_actions::{Action, ActionResult};
use hcloud_core::id::{FloatingIpId, ServerId};
use hcloud_core::query::ListParams;
use hcloud_core::types::{DnsPtr, Labels, Location, Protection};
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};

use crate::common::{ChangeProtectionBody, DnsPtrBody, IpType};

/// An IP that can be moved between servers in one network zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloatingIp {
    /// Floating IP ID.
    pub id: FloatingIpId,
    /// Unique name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Address, or network for IPv6.
    pub ip: String,
    /// Address family.
    #[serde(rename = "type")]
    pub kind: IpType,
    /// Server the IP is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerId>,
    /// Reverse DNS entries.
    #[serde(default)]
    pub dns_ptr: Vec<DnsPtr>,
    /// Location the IP is routed to by default.
    pub home_location: Location,
    /// Address is blocked for abuse.
    #[serde(default)]
    pub blocked: bool,
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

impl Resource for FloatingIp {
    type Id = FloatingIpId;
    const SINGULAR: &'static str = "floating_ip";
    const PLURAL: &'static str = "floating_ips";
    const PATH: &'static str = "floating_ips";
}

/// Request body for creating a floating IP.
///
/// Either `server` or `home_location` must be set.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FloatingIpCreateOpts {
    /// Address family.
    #[serde(rename = "type")]
    pub kind: IpType,
    /// Assign to this server right away.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerId>,
    /// Home location name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_location: Option<String>,
    /// Unique name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Response of creating a floating IP.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FloatingIpCreateResult {
    /// The new floating IP.
    pub floating_ip: FloatingIp,
    /// Assignment action when a server was given.
    #[serde(default)]
    pub action: Option<Action>,
}

/// Changes to a floating IP.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FloatingIpUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

#[derive(Serialize)]
struct AssignBody {
    server: ServerId,
}

/// Client for floating IPs.
#[derive(Debug, Clone)]
pub struct FloatingIpClient {
    resources: ResourceClient<FloatingIp>,
}

impl FloatingIpClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(FloatingIp, ListParams);

    /// Create a floating IP.
    ///
    /// # Errors
    ///
    /// Returns [`hcloud_core::Error::InvalidRequest`] if neither server nor home location is
    /// set, or transport and decoding errors.
    pub async fn create(&self, opts: &FloatingIpCreateOpts) -> Result<FloatingIpCreateResult> {
        if opts.server.is_none() && opts.home_location.is_none() {
            return Err(hcloud_core::Error::InvalidRequest(
                "floating IP needs a server or a home location".to_string(),
            ));
        }
        self.resources.create(opts).await
    }

    /// Update a floating IP.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: FloatingIpId, opts: &FloatingIpUpdateOpts) -> Result<FloatingIp> {
        self.resources.update(id, opts).await
    }

    /// Delete a floating IP.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: FloatingIpId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Assign to a server.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn assign(&self, id: FloatingIpId, server: ServerId) -> Result<ActionResult> {
        self.resources
            .action(id, "assign", Some(&AssignBody { server }))
            .await
    }

    /// Unassign from its server.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn unassign(&self, id: FloatingIpId) -> Result<ActionResult> {
        self.resources.action::<(), _>(id, "unassign", None).await
    }

    /// Set or reset (`None`) the reverse DNS entry of an address.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_dns_ptr(
        &self,
        id: FloatingIpId,
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
    pub async fn change_protection(&self, id: FloatingIpId, delete: bool) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&ChangeProtectionBody { delete }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{action_json, service};
    use hcloud_core::Error;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_with_server_returns_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/floating_ips"))
            .and(body_json(json!({"type": "ipv4", "server": 42, "name": "web"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "floating_ip": {
                    "id": 4711,
                    "name": "web",
                    "ip": "131.232.99.1",
                    "type": "ipv4",
                    "server": 42,
                    "dns_ptr": [{"ip": "131.232.99.1", "dns_ptr": "web.example.com"}],
                    "home_location": {"id": 1, "name": "fsn1"},
                    "blocked": false,
                    "protection": {"delete": false},
                    "labels": {}
                },
                "action": action_json(13, "assign_floating_ip")
            })))
            .mount(&server)
            .await;

        let client = FloatingIpClient::new(service(&server));
        let result = client
            .create(&FloatingIpCreateOpts {
                kind: IpType::Ipv4,
                server: Some(ServerId::new(42)),
                home_location: None,
                name: Some("web".to_string()),
                description: None,
                labels: None,
            })
            .await
            .unwrap();
        assert_eq!(result.floating_ip.server, Some(ServerId::new(42)));
        assert_eq!(result.action.map(|a| a.command), Some("assign_floating_ip".to_string()));
    }

    #[tokio::test]
    async fn create_requires_target() {
        let server = MockServer::start().await;
        let client = FloatingIpClient::new(service(&server));
        let err = client
            .create(&FloatingIpCreateOpts {
                kind: IpType::Ipv6,
                server: None,
                home_location: None,
                name: None,
                description: None,
                labels: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn assign_and_unassign() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/floating_ips/4711/actions/assign"))
            .and(body_json(json!({"server": 42})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "action": action_json(1, "assign_floating_ip")
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/floating_ips/4711/actions/unassign"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "action": action_json(2, "unassign_floating_ip")
            })))
            .mount(&server)
            .await;

        let client = FloatingIpClient::new(service(&server));
        let id = FloatingIpId::new(4711);
        client.assign(id, ServerId::new(42)).await.unwrap();
        let result = client.unassign(id).await.unwrap();
        assert_eq!(result.action.command, "unassign_floating_ip");
    }
}
