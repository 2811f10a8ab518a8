//! ISO images that can be attached to servers.

use hcloud_core::id::IsoId;
use hcloud_core::query::QueryParams;
use hcloud_core::types::DeprecationInfo;
use hcloud_core::{Resource, ResourceClient, ServiceClient};
use serde::{Deserialize, Serialize};

/// An ISO image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Iso {
    /// ISO ID.
    pub id: IsoId,
    /// Unique name; private ISOs have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// `public` or `private`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// CPU architecture; absent for architecture-independent ISOs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    /// Deprecation of the ISO.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<DeprecationInfo>,
}

impl Resource for Iso {
    type Id = IsoId;
    const SINGULAR: &'static str = "iso";
    const PLURAL: &'static str = "isos";
    const PATH: &'static str = "isos";
}

/// Filters supported by the `/isos` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IsoListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by architecture.
    pub architecture: Vec<String>,
    /// Also return ISOs without an architecture when filtering by one.
    pub include_architecture_wildcard: Option<bool>,
}

impl IsoListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_all("architecture", &self.architecture);
        params.push_opt(
            "include_architecture_wildcard",
            self.include_architecture_wildcard,
        );
        params.into_pairs()
    }
}

/// Read-only client for ISOs.
#[derive(Debug, Clone)]
pub struct IsoClient {
    resources: ResourceClient<Iso>,
}

impl IsoClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Iso, IsoListParams);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::service;
    use hcloud_core::ListOpts;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_with_architecture_wildcard() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/isos"))
            .and(query_param("architecture", "x86"))
            .and(query_param("include_architecture_wildcard", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isos": [
                    {"id": 1, "name": "FreeBSD-11.0", "description": "FreeBSD 11.0 x64", "type": "public", "architecture": "x86"},
                    {"id": 2, "name": "virtio-win", "description": "virtio drivers", "type": "public", "architecture": null}
                ]
            })))
            .mount(&server)
            .await;

        let client = IsoClient::new(service(&server));
        let params = IsoListParams {
            architecture: vec!["x86".to_string()],
            include_architecture_wildcard: Some(true),
            ..IsoListParams::default()
        };
        let isos = client.all(&ListOpts::default(), &params).await.unwrap();
        assert_eq!(isos.len(), 2);
        assert!(isos[1].architecture.is_none());
    }

    #[tokio::test]
    async fn get_by_id_missing_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/isos/9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "not_found", "message": "iso not found"}
            })))
            .mount(&server)
            .await;

        let client = IsoClient::new(service(&server));
        assert!(client.get_by_id(IsoId::new(9)).await.unwrap().is_none());
    }
}
