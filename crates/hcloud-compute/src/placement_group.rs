//! Placement groups.

use chrono::{DateTime, Utc};
use hcloud_actions::Action;
use hcloud_core::id::{PlacementGroupId, ServerId};
use hcloud_core::query::QueryParams;
use hcloud_core::types::Labels;
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Placement strategy. `spread` is the only one offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementGroupType {
    /// Servers are placed on distinct hosts.
    #[default]
    Spread,
}

impl std::fmt::Display for PlacementGroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("spread")
    }
}

/// A group of servers with a placement constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementGroup {
    /// Placement group ID.
    pub id: PlacementGroupId,
    /// Unique name.
    pub name: String,
    /// Placement strategy.
    #[serde(rename = "type")]
    pub kind: PlacementGroupType,
    /// Member servers.
    #[serde(default)]
    pub servers: Vec<ServerId>,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Resource for PlacementGroup {
    type Id = PlacementGroupId;
    const SINGULAR: &'static str = "placement_group";
    const PLURAL: &'static str = "placement_groups";
    const PATH: &'static str = "placement_groups";
}

/// Filters supported by the `/placement_groups` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlacementGroupListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by type.
    pub kinds: Vec<PlacementGroupType>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl PlacementGroupListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_all("type", &self.kinds);
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}

/// Request body for creating a placement group.
#[derive(Debug, Clone, Serialize, Validate, PartialEq, Eq)]
pub struct PlacementGroupCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Placement strategy.
    #[serde(rename = "type")]
    pub kind: PlacementGroupType,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Response of creating a placement group.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlacementGroupCreateResult {
    /// The new placement group.
    pub placement_group: PlacementGroup,
    /// Action started by the creation, if any.
    #[serde(default)]
    pub action: Option<Action>,
}

/// Changes to a placement group.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct PlacementGroupUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Client for placement groups.
#[derive(Debug, Clone)]
pub struct PlacementGroupClient {
    resources: ResourceClient<PlacementGroup>,
}

impl PlacementGroupClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(PlacementGroup, PlacementGroupListParams);

    /// Create a placement group.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, opts: &PlacementGroupCreateOpts) -> Result<PlacementGroupCreateResult> {
        opts.validate()?;
        self.resources.create(opts).await
    }

    /// Update a placement group.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(
        &self,
        id: PlacementGroupId,
        opts: &PlacementGroupUpdateOpts,
    ) -> Result<PlacementGroup> {
        self.resources.update(id, opts).await
    }

    /// Delete a placement group.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: PlacementGroupId) -> Result<()> {
        self.resources.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::service;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_without_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/placement_groups"))
            .and(body_json(json!({"name": "db", "type": "spread"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "placement_group": {"id": 897, "name": "db", "type": "spread", "servers": [], "labels": {}},
                "action": null
            })))
            .mount(&server)
            .await;

        let client = PlacementGroupClient::new(service(&server));
        let result = client
            .create(&PlacementGroupCreateOpts {
                name: "db".to_string(),
                kind: PlacementGroupType::Spread,
                labels: None,
            })
            .await
            .unwrap();
        assert_eq!(result.placement_group.id, PlacementGroupId::new(897));
        assert!(result.action.is_none());
    }

    #[tokio::test]
    async fn update_renames() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/placement_groups/897"))
            .and(body_json(json!({"name": "db-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "placement_group": {"id": 897, "name": "db-2", "type": "spread", "servers": [42]}
            })))
            .mount(&server)
            .await;

        let client = PlacementGroupClient::new(service(&server));
        let group = client
            .update(
                PlacementGroupId::new(897),
                &PlacementGroupUpdateOpts {
                    name: Some("db-2".to_string()),
                    labels: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(group.servers, vec![ServerId::new(42)]);
    }
}
