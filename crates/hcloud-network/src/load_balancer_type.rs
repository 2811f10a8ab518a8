//! Load balancer types.

use hcloud_core::id::LoadBalancerTypeId;
use hcloud_core::query::ListParams;
use hcloud_core::types::{DeprecationInfo, Price};
use hcloud_core::{Resource, ResourceClient, ServiceClient};
use serde::{Deserialize, Serialize};

/// Price of a load balancer type in one location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadBalancerTypeLocationPrice {
    /// Location name.
    pub location: String,
    /// Hourly price.
    pub price_hourly: Price,
    /// Monthly price.
    pub price_monthly: Price,
}

/// A load balancer size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadBalancerType {
    /// Type ID.
    pub id: LoadBalancerTypeId,
    /// Unique name, e.g. `lb11`.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Maximum concurrent connections.
    #[serde(default)]
    pub max_connections: u64,
    /// Maximum number of services.
    #[serde(default)]
    pub max_services: u32,
    /// Maximum number of targets.
    #[serde(default)]
    pub max_targets: u32,
    /// Maximum number of certificates per service.
    #[serde(default)]
    pub max_assigned_certificates: u32,
    /// Prices per location.
    #[serde(default)]
    pub prices: Vec<LoadBalancerTypeLocationPrice>,
    /// Deprecation, if announced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<DeprecationInfo>,
}

impl Resource for LoadBalancerType {
    type Id = LoadBalancerTypeId;
    const SINGULAR: &'static str = "load_balancer_type";
    const PLURAL: &'static str = "load_balancer_types";
    const PATH: &'static str = "load_balancer_types";
}

/// Read-only client for load balancer types.
#[derive(Debug, Clone)]
pub struct LoadBalancerTypeClient {
    resources: ResourceClient<LoadBalancerType>,
}

impl LoadBalancerTypeClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(LoadBalancerType, ListParams);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::service;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_by_name_reads_limits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/load_balancer_types"))
            .and(query_param("name", "lb11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "load_balancer_types": [{
                    "id": 1,
                    "name": "lb11",
                    "max_connections": 20000,
                    "max_services": 5,
                    "max_targets": 25,
                    "max_assigned_certificates": 10,
                    "prices": [{
                        "location": "fsn1",
                        "price_hourly": {"net": "0.0080", "gross": "0.0095"},
                        "price_monthly": {"net": "4.9000", "gross": "5.8310"}
                    }]
                }]
            })))
            .mount(&server)
            .await;

        let client = LoadBalancerTypeClient::new(service(&server));
        let lb_type = client.get_by_name("lb11").await.unwrap().unwrap();
        assert_eq!(lb_type.max_targets, 25);
        assert_eq!(lb_type.prices[0].location, "fsn1");
    }
}
