//! Block storage volumes.

use chrono::{DateTime, Utc};
use hcloud_actions::{splice_actions, Action, ActionResult};
use hcloud_core::id::{ServerId, VolumeId};
use hcloud_core::query::QueryParams;
use hcloud_core::types::{Labels, Location, Protection};
use hcloud_core::{Error, Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

/// Smallest volume in GB.
pub const MIN_VOLUME_SIZE: u32 = 10;
/// Largest volume in GB.
pub const MAX_VOLUME_SIZE: u32 = 10_240;

/// Availability of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeStatus {
    /// Still being provisioned.
    Creating,
    /// Ready to be attached.
    Available,
}

impl std::fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Creating => "creating",
            Self::Available => "available",
        })
    }
}

/// A block storage volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Volume {
    /// Volume ID.
    pub id: VolumeId,
    /// Unique name.
    pub name: String,
    /// Server the volume is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerId>,
    /// Location of the volume.
    pub location: Location,
    /// Size in GB.
    pub size: u32,
    /// Device path on the attached server.
    #[serde(default)]
    pub linux_device: String,
    /// Protection flags.
    #[serde(default)]
    pub protection: Protection,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Availability.
    pub status: VolumeStatus,
    /// Filesystem the volume was formatted with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Volume {
    /// Whether the volume is attached to a server.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.server.is_some()
    }
}

impl Resource for Volume {
    type Id = VolumeId;
    const SINGULAR: &'static str = "volume";
    const PLURAL: &'static str = "volumes";
    const PATH: &'static str = "volumes";
}

/// Filters supported by the `/volumes` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VolumeListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by status.
    pub statuses: Vec<VolumeStatus>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl VolumeListParams {
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

/// Request body for creating a volume.
///
/// Either `server` or `location` must be set.
#[derive(Debug, Clone, Default, Serialize, Validate, PartialEq, Eq)]
pub struct VolumeCreateOpts {
    /// Unique name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Size in GB.
    #[validate(range(min = 10, max = 10240))]
    pub size: u32,
    /// Attach to this server after creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerId>,
    /// Location name for an unattached volume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Mount the volume on the server after attaching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automount: Option<bool>,
    /// Filesystem, `ext4` or `xfs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

impl VolumeCreateOpts {
    fn check(&self) -> Result<()> {
        if self.server.is_none() && self.location.is_none() {
            return Err(Error::InvalidRequest(
                "volume needs a server or a location".to_string(),
            ));
        }
        if self.automount == Some(true) && self.server.is_none() {
            return Err(Error::InvalidRequest(
                "automount requires a server".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response of creating a volume.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VolumeCreateResult {
    /// The new volume.
    pub volume: Volume,
    /// The create action.
    pub action: Action,
    /// Follow-up actions, e.g. attaching and formatting.
    #[serde(default)]
    pub next_actions: Vec<Action>,
}

impl VolumeCreateResult {
    /// Every action started by the creation, primary action first.
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        splice_actions(self.action.clone(), self.next_actions.clone())
    }
}

/// Changes to a volume.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct VolumeUpdateOpts {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

#[derive(Serialize)]
struct AttachBody {
    server: ServerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    automount: Option<bool>,
}

#[derive(Serialize)]
struct ResizeBody {
    size: u32,
}

#[derive(Serialize)]
struct ChangeProtectionBody {
    delete: bool,
}

/// Client for volumes.
#[derive(Debug, Clone)]
pub struct VolumeClient {
    resources: ResourceClient<Volume>,
}

impl VolumeClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Volume, VolumeListParams);

    /// Create a volume.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, opts: &VolumeCreateOpts) -> Result<VolumeCreateResult> {
        opts.validate()?;
        opts.check()?;
        debug!(name = %opts.name, size = opts.size, "creating volume");
        self.resources.create(opts).await
    }

    /// Update a volume.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: VolumeId, opts: &VolumeUpdateOpts) -> Result<Volume> {
        self.resources.update(id, opts).await
    }

    /// Delete a detached volume.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn delete(&self, id: VolumeId) -> Result<()> {
        self.resources.delete(id).await
    }

    /// Attach to a server in the same location.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn attach(
        &self,
        id: VolumeId,
        server: ServerId,
        automount: Option<bool>,
    ) -> Result<ActionResult> {
        self.resources
            .action(id, "attach", Some(&AttachBody { server, automount }))
            .await
    }

    /// Detach from its server.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn detach(&self, id: VolumeId) -> Result<ActionResult> {
        self.resources.action::<(), _>(id, "detach", None).await
    }

    /// Grow a volume; volumes cannot shrink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for sizes outside the supported range, or transport
    /// and decoding errors.
    pub async fn resize(&self, id: VolumeId, size: u32) -> Result<ActionResult> {
        if !(MIN_VOLUME_SIZE..=MAX_VOLUME_SIZE).contains(&size) {
            return Err(Error::InvalidRequest(format!(
                "volume size {size} GB is outside {MIN_VOLUME_SIZE}..={MAX_VOLUME_SIZE}"
            )));
        }
        self.resources
            .action(id, "resize", Some(&ResizeBody { size }))
            .await
    }

    /// Enable or disable delete protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(&self, id: VolumeId, delete: bool) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&ChangeProtectionBody { delete }))
            .await
    }
}
