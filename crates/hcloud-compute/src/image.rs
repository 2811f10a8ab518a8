//! Images, snapshots and backups.

use chrono::{DateTime, Utc};
use hcloud_actions::ActionResult;
use hcloud_core::id::{ImageId, ServerId};
use hcloud_core::query::QueryParams;
use hcloud_core::types::{Labels, Protection};
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};

use crate::deprecation::{analyze_image, DeprecationWarning};

/// Kind of image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Operating system image provided by Hetzner.
    System,
    /// Application image provided by Hetzner.
    App,
    /// User snapshot.
    Snapshot,
    /// Automatic server backup.
    Backup,
    /// Temporary image created during rebuilds.
    Temporary,
}

impl ImageType {
    fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::App => "app",
            Self::Snapshot => "snapshot",
            Self::Backup => "backup",
            Self::Temporary => "temporary",
        }
    }
}

impl std::fmt::Display for ImageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// Ready to be used.
    Available,
    /// Still being created.
    Creating,
    /// No longer usable.
    Unavailable,
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Available => "available",
            Self::Creating => "creating",
            Self::Unavailable => "unavailable",
        })
    }
}

/// Server an image was created from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageCreatedFrom {
    /// Server ID.
    pub id: ServerId,
    /// Server name at creation time.
    pub name: String,
}

/// An image servers can be created from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    /// Image ID.
    pub id: ImageId,
    /// Image kind.
    #[serde(rename = "type")]
    pub kind: ImageType,
    /// Availability.
    pub status: ImageStatus,
    /// Unique name; snapshots and backups have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Size of the compressed image in GB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<f64>,
    /// Disk size required to use the image in GB.
    #[serde(default)]
    pub disk_size: f64,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Server the image was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_from: Option<ImageCreatedFrom>,
    /// Server a backup is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_to: Option<ServerId>,
    /// Operating system flavor, e.g. `ubuntu`.
    #[serde(default)]
    pub os_flavor: String,
    /// Operating system version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// Image is optimized for fast server creation.
    #[serde(default)]
    pub rapid_deploy: bool,
    /// Protection flags.
    #[serde(default)]
    pub protection: Protection,
    /// When the image was announced as deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<DateTime<Utc>>,
    /// When the image was deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// CPU architecture, `x86` or `arm`.
    #[serde(default)]
    pub architecture: String,
}

impl Image {
    /// Name if set, otherwise the description.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.description)
    }

    /// Deprecation warning for this image as of now.
    #[must_use]
    pub fn deprecation_warning(&self) -> DeprecationWarning {
        analyze_image(self)
    }
}

impl Resource for Image {
    type Id = ImageId;
    const SINGULAR: &'static str = "image";
    const PLURAL: &'static str = "images";
    const PATH: &'static str = "images";
}

/// Filters supported by the `/images` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImageListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by image kind.
    pub kinds: Vec<ImageType>,
    /// Filter by status.
    pub statuses: Vec<ImageStatus>,
    /// Only backups bound to this server.
    pub bound_to: Option<ServerId>,
    /// Include deprecated images.
    pub include_deprecated: Option<bool>,
    /// Filter by architecture.
    pub architecture: Option<String>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl ImageListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_all("type", &self.kinds);
        params.push_all("status", &self.statuses);
        params.push_opt("bound_to", self.bound_to);
        params.push_opt("include_deprecated", self.include_deprecated);
        params.push_opt("architecture", self.architecture.as_deref());
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}

/// Changes to an image.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct ImageUpdateOpts {
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Convert a backup into a snapshot.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ImageType>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

#[derive(Serialize)]
struct ChangeProtection {
    delete: bool,
}

/// Client for images.
#[derive(Debug, Clone)]
pub struct ImageClient {
    resources: ResourceClient<Image>,
}

impl ImageClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Image, ImageListParams);

    /// Fetch an image by name for one architecture.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get_by_name_and_architecture(
        &self,
        name: &str,
        architecture: &str,
    ) -> Result<Option<Image>> {
        if name.is_empty() {
            return Ok(None);
        }
        let params = ImageListParams {
            name: Some(name.to_string()),
            architecture: Some(architecture.to_string()),
            include_deprecated: Some(true),
            ..ImageListParams::default()
        };
        let (images, _) = self
            .list(&hcloud_core::ListOpts::default(), &params)
            .await?;
        Ok(images.into_iter().next())
    }

    /// Update an image.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: ImageId, opts: &ImageUpdateOpts) -> Result<Image> {
        self.resources.update(id, opts).await
    }

    /// Delete an image.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: ImageId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Enable or disable delete protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(&self, id: ImageId, delete: bool) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&ChangeProtection { delete }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{action_json, service};
    use hcloud_core::ListOpts;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn list_params_repeat_type() {
        let params = ImageListParams {
            kinds: vec![ImageType::System, ImageType::Snapshot],
            include_deprecated: Some(true),
            ..ImageListParams::default()
        };
        assert_eq!(
            params.to_pairs(),
            vec![
                ("type", "system".to_string()),
                ("type", "snapshot".to_string()),
                ("include_deprecated", "true".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn list_filters_by_architecture() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .and(query_param("name", "ubuntu-24.04"))
            .and(query_param("architecture", "arm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": [{
                    "id": 103908070,
                    "type": "system",
                    "status": "available",
                    "name": "ubuntu-24.04",
                    "description": "Ubuntu 24.04",
                    "architecture": "arm"
                }]
            })))
            .mount(&server)
            .await;

        let client = ImageClient::new(service(&server));
        let image = client
            .get_by_name_and_architecture("ubuntu-24.04", "arm")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(image.architecture, "arm");
        assert_eq!(image.kind, ImageType::System);
        assert!(image.deprecation_warning().is_empty());
    }

    #[tokio::test]
    async fn update_sends_changes() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/images/4"))
            .and(body_json(json!({"description": "golden", "type": "snapshot"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "image": {"id": 4, "type": "snapshot", "status": "available", "description": "golden"}
            })))
            .mount(&server)
            .await;

        let client = ImageClient::new(service(&server));
        let opts = ImageUpdateOpts {
            description: Some("golden".to_string()),
            kind: Some(ImageType::Snapshot),
            labels: None,
        };
        let image = client.update(ImageId::new(4), &opts).await.unwrap();
        assert_eq!(image.display_name(), "golden");
    }

    #[tokio::test]
    async fn change_protection_returns_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/4/actions/change_protection"))
            .and(body_json(json!({"delete": true})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "action": action_json(13, "change_protection")
            })))
            .mount(&server)
            .await;

        let client = ImageClient::new(service(&server));
        let result = client
            .change_protection(ImageId::new(4), true)
            .await
            .unwrap();
        assert_eq!(result.action.command, "change_protection");
    }

    #[tokio::test]
    async fn list_reads_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": [],
                "meta": {"pagination": {"page": 2, "per_page": 10, "previous_page": 1, "next_page": null}}
            })))
            .mount(&server)
            .await;

        let client = ImageClient::new(service(&server));
        let (images, meta) = client
            .list(&ListOpts::page(2, 10), &ImageListParams::default())
            .await
            .unwrap();
        assert!(images.is_empty());
        assert_eq!(meta.pagination.and_then(|p| p.previous_page), Some(1));
    }
}
