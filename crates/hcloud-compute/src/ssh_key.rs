//! SSH keys.

use chrono::{DateTime, Utc};
use hcloud_core::id::SshKeyId;
use hcloud_core::query::QueryParams;
use hcloud_core::types::Labels;
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A public SSH key that can be injected into servers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshKey {
    /// SSH key ID.
    pub id: SshKeyId,
    /// Unique name.
    pub name: String,
    /// MD5 fingerprint of the key.
    #[serde(default)]
    pub fingerprint: String,
    /// Public key in OpenSSH format.
    #[serde(default)]
    pub public_key: String,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Resource for SshKey {
    type Id = SshKeyId;
    const SINGULAR: &'static str = "ssh_key";
    const PLURAL: &'static str = "ssh_keys";
    const PATH: &'static str = "ssh_keys";
}

/// Filters supported by the `/ssh_keys` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SshKeyListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by fingerprint.
    pub fingerprint: Option<String>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl SshKeyListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_opt("fingerprint", self.fingerprint.as_deref());
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}

/// Request body for creating an SSH key.
#[derive(Debug, Clone, Serialize, Validate, PartialEq, Eq)]
pub struct SshKeyCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Public key in OpenSSH format.
    #[validate(length(min = 1))]
    pub public_key: String,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Changes to an SSH key.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct SshKeyUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Client for SSH keys.
#[derive(Debug, Clone)]
pub struct SshKeyClient {
    resources: ResourceClient<SshKey>,
}

impl SshKeyClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(SshKey, SshKeyListParams);

    /// Fetch an SSH key by fingerprint.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get_by_fingerprint(&self, fingerprint: &str) -> Result<Option<SshKey>> {
        let params = SshKeyListParams {
            fingerprint: Some(fingerprint.to_string()),
            ..SshKeyListParams::default()
        };
        let (keys, _) = self
            .list(&hcloud_core::ListOpts::default(), &params)
            .await?;
        Ok(keys.into_iter().next())
    }

    /// Upload a public key.
    ///
    /// # Errors
    ///
    /// Returns [`hcloud_core::Error::ValidationError`] for an empty name or key, or transport
    /// and decoding errors.
    pub async fn create(&self, opts: &SshKeyCreateOpts) -> Result<SshKey> {
        opts.validate()?;
        self.resources.create_item(opts).await
    }

    /// Update an SSH key.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: SshKeyId, opts: &SshKeyUpdateOpts) -> Result<SshKey> {
        self.resources.update(id, opts).await
    }

    /// Delete an SSH key.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: SshKeyId) -> Result<()> {
        self.resources.delete(id).await
    }
}
