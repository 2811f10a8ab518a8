//! DNS zones.

use chrono::{DateTime, Utc};
use hcloud_actions::{Action, ActionResult};
use hcloud_core::id::ZoneId;
use hcloud_core::query::QueryParams;
use hcloud_core::resource::take_field;
use hcloud_core::types::{Labels, Protection};
use hcloud_core::{Resource, ResourceClient, Result, ServiceClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use validator::Validate;

use crate::rrset::{RRSetClient, RRSetCreateOpts};

/// Whether the zone is edited here or transferred from elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneMode {
    /// Records are managed through the API.
    #[default]
    Primary,
    /// Records are transferred from primary nameservers.
    Secondary,
}

impl std::fmt::Display for ZoneMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        })
    }
}

/// Provisioning state of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    /// Zone is served.
    Ok,
    /// A change is being rolled out.
    Updating,
    /// The last change failed.
    Error,
    /// Any state this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// Primary nameserver of a secondary zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZonePrimaryNameserver {
    /// Address of the nameserver.
    pub address: String,
    /// Port, 53 by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// TSIG algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsig_algorithm: Option<String>,
    /// TSIG key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsig_key: Option<String>,
}

/// Nameservers responsible for a zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneAuthoritativeNameservers {
    /// Nameservers assigned by Hetzner.
    #[serde(default)]
    pub assigned: Vec<String>,
    /// Nameservers the registry delegates to.
    #[serde(default)]
    pub delegated: Vec<String>,
    /// When the delegation was last checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_last_check: Option<DateTime<Utc>>,
    /// `valid`, `partially-valid`, `invalid`, `lame` or `unregistered`.
    #[serde(default)]
    pub delegation_status: String,
}

/// A DNS zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Zone {
    /// Zone ID.
    pub id: ZoneId,
    /// Domain name, e.g. `example.com`.
    pub name: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Primary or secondary.
    #[serde(default)]
    pub mode: ZoneMode,
    /// Primary nameservers of a secondary zone.
    #[serde(default)]
    pub primary_nameservers: Vec<ZonePrimaryNameserver>,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Protection flags.
    #[serde(default)]
    pub protection: Protection,
    /// Default TTL of record sets without their own.
    pub ttl: u32,
    /// Provisioning state.
    pub status: ZoneStatus,
    /// Number of records.
    #[serde(default)]
    pub record_count: u32,
    /// Nameservers responsible for the zone.
    #[serde(default)]
    pub authoritative_nameservers: ZoneAuthoritativeNameservers,
    /// `hetzner`, `other` or `unknown`.
    #[serde(default)]
    pub registrar: String,
}

impl Resource for Zone {
    type Id = ZoneId;
    const SINGULAR: &'static str = "zone";
    const PLURAL: &'static str = "zones";
    const PATH: &'static str = "zones";
}

/// Filters supported by the `/zones` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ZoneListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by mode.
    pub mode: Option<ZoneMode>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl ZoneListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_opt("name", self.name.as_deref());
        params.push_opt("mode", self.mode);
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}

/// Request body for creating a zone.
#[derive(Debug, Clone, Default, Serialize, Validate, PartialEq, Eq)]
pub struct ZoneCreateOpts {
    /// Domain name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Primary or secondary.
    pub mode: ZoneMode,
    /// Default TTL.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 60))]
    pub ttl: Option<u32>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    /// Primary nameservers, required for secondary zones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_nameservers: Vec<ZonePrimaryNameserver>,
    /// Initial record sets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rrsets: Vec<RRSetCreateOpts>,
    /// Initial records as a BIND zone file; exclusive with `rrsets`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zonefile: Option<String>,
}

/// Response of creating a zone.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ZoneCreateResult {
    /// The new zone.
    pub zone: Zone,
    /// Provisioning action.
    pub action: Action,
}

/// Changes to a zone.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ZoneUpdateOpts {
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

#[derive(Serialize)]
struct TtlBody {
    ttl: u32,
}

#[derive(Serialize)]
struct ChangeProtectionBody {
    delete: bool,
}

#[derive(Serialize)]
struct ZonefileBody<'a> {
    zonefile: &'a str,
}

/// Client for DNS zones.
#[derive(Debug, Clone)]
pub struct ZoneClient {
    resources: ResourceClient<Zone>,
}

impl ZoneClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Zone, ZoneListParams);

    /// Client for the record sets of every zone.
    #[must_use]
    pub fn rrsets(&self) -> RRSetClient {
        RRSetClient::new(self.resources.service().clone())
    }

    /// Create a zone.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors. Passing both `rrsets` and
    /// `zonefile` is an [`hcloud_core::Error::InvalidRequest`].
    pub async fn create(&self, opts: &ZoneCreateOpts) -> Result<ZoneCreateResult> {
        opts.validate()?;
        if !opts.rrsets.is_empty() && opts.zonefile.is_some() {
            return Err(hcloud_core::Error::InvalidRequest(
                "rrsets and zonefile are mutually exclusive".to_string(),
            ));
        }
        if opts.mode == ZoneMode::Secondary && opts.primary_nameservers.is_empty() {
            return Err(hcloud_core::Error::InvalidRequest(
                "secondary zones need primary nameservers".to_string(),
            ));
        }
        debug!(zone = %opts.name, mode = %opts.mode, "creating zone");
        self.resources.create(opts).await
    }

    /// Update a zone.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(&self, id: ZoneId, opts: &ZoneUpdateOpts) -> Result<Zone> {
        self.resources.update(id, opts).await
    }

    /// Delete a zone and all its record sets.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn delete(&self, id: ZoneId) -> Result<ActionResult> {
        self.resources.delete_returning(id).await
    }

    /// Change the default TTL.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_ttl(&self, id: ZoneId, ttl: u32) -> Result<ActionResult> {
        self.resources
            .action(id, "change_ttl", Some(&TtlBody { ttl }))
            .await
    }

    /// Enable or disable delete protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(&self, id: ZoneId, delete: bool) -> Result<ActionResult> {
        self.resources
            .action(id, "change_protection", Some(&ChangeProtectionBody { delete }))
            .await
    }

    /// Replace all records with the content of a BIND zone file.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn import_zonefile(&self, id: ZoneId, zonefile: &str) -> Result<ActionResult> {
        self.resources
            .action(id, "import_zonefile", Some(&ZonefileBody { zonefile }))
            .await
    }

    /// Render the zone as a BIND zone file.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn export_zonefile(&self, id: ZoneId) -> Result<String> {
        let path = format!("{}/zonefile", ResourceClient::<Zone>::item_path(id));
        let mut body: Value = self.resources.service().get_json(&path, &[]).await?;
        take_field(&mut body, "zonefile")
    }
}
