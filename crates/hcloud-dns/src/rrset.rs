//! Record sets of DNS zones.
//!
//! A record set groups every record of one name and type inside a zone and is addressed
//! as `<name>/<type>`, e.g. `www/A`.

use hcloud_actions::{Action, ActionResult};
use hcloud_core::id::ZoneId;
use hcloud_core::query::{ListOpts, QueryParams, ALL_PAGES_PER_PAGE};
use hcloud_core::resource::take_field;
use hcloud_core::types::{Labels, Meta};
use hcloud_core::{Error, Result, ServiceClient};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::txt::{format_txt, parse_txt};

/// Record type of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum RRSetType {
    A,
    Aaaa,
    Caa,
    Cname,
    Ds,
    Hinfo,
    Https,
    Mx,
    Ns,
    Ptr,
    Rp,
    Soa,
    Srv,
    Svcb,
    Tlsa,
    Txt,
}

impl RRSetType {
    /// Name as used in paths and zone files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Caa => "CAA",
            Self::Cname => "CNAME",
            Self::Ds => "DS",
            Self::Hinfo => "HINFO",
            Self::Https => "HTTPS",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Ptr => "PTR",
            Self::Rp => "RP",
            Self::Soa => "SOA",
            Self::Srv => "SRV",
            Self::Svcb => "SVCB",
            Self::Tlsa => "TLSA",
            Self::Txt => "TXT",
        }
    }
}

impl std::fmt::Display for RRSetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of a record set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RRSetRecord {
    /// Record data in zone file notation.
    pub value: String,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RRSetRecord {
    /// A record with the given data.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            comment: None,
        }
    }

    /// A TXT record carrying `text`, split into quoted chunks.
    #[must_use]
    pub fn txt(text: &str) -> Self {
        Self::new(format_txt(text))
    }

    /// The text of a TXT record with quoting and chunking removed.
    #[must_use]
    pub fn txt_value(&self) -> String {
        parse_txt(&self.value)
    }
}

/// Change protection of a record set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RRSetProtection {
    /// Record set cannot be changed while set.
    #[serde(default)]
    pub change: bool,
}

/// All records of one name and type in a zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RRSet {
    /// `<name>/<type>`.
    pub id: String,
    /// Relative name, `@` for the apex.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub kind: RRSetType,
    /// Zone the record set belongs to.
    pub zone: ZoneId,
    /// TTL; the zone default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// User-defined labels.
    #[serde(default)]
    pub labels: Labels,
    /// Protection flags.
    #[serde(default)]
    pub protection: RRSetProtection,
    /// Records.
    #[serde(default)]
    pub records: Vec<RRSetRecord>,
}

impl RRSet {
    /// Decoded text of every record of a TXT record set.
    #[must_use]
    pub fn txt_values(&self) -> Vec<String> {
        self.records.iter().map(RRSetRecord::txt_value).collect()
    }
}

/// Filters supported by the record set list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RRSetListParams {
    /// Filter by name.
    pub name: Option<String>,
    /// Filter by type.
    pub kinds: Vec<RRSetType>,
    /// Sort expressions.
    pub sort: Vec<String>,
}

impl RRSetListParams {
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

/// Request body for creating a record set.
#[derive(Debug, Clone, Serialize, Validate, PartialEq, Eq)]
pub struct RRSetCreateOpts {
    /// Relative name, `@` for the apex.
    #[validate(length(min = 1))]
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub kind: RRSetType,
    /// TTL; the zone default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Records.
    #[validate(length(min = 1))]
    pub records: Vec<RRSetRecord>,
    /// User-defined labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

/// Response of creating a record set.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RRSetCreateResult {
    /// The new record set.
    pub rrset: RRSet,
    /// Provisioning action.
    pub action: Action,
}

/// Changes to a record set.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct RRSetUpdateOpts {
    /// Replace the labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

#[derive(Serialize)]
struct RecordsBody<'a> {
    records: &'a [RRSetRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
}

#[derive(Serialize)]
struct TtlBody {
    ttl: Option<u32>,
}

#[derive(Serialize)]
struct ChangeProtectionBody {
    change: bool,
}

/// Client for record sets.
#[derive(Debug, Clone)]
pub struct RRSetClient {
    inner: ServiceClient,
}

impl RRSetClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self { inner }
    }

    fn collection_path(zone: ZoneId) -> String {
        format!("zones/{zone}/rrsets")
    }

    fn item_path(zone: ZoneId, name: &str, kind: RRSetType) -> String {
        format!("zones/{zone}/rrsets/{name}/{kind}")
    }

    /// Fetch a record set by name and type; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn get_by_name_and_type(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
    ) -> Result<Option<RRSet>> {
        let body: Option<Value> = self
            .inner
            .get_optional(&Self::item_path(zone, name, kind))
            .await?;
        body.map(|mut body| take_field(&mut body, "rrset"))
            .transpose()
    }

    /// Fetch a record set by its `<name>/<type>` ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] for malformed IDs, or transport and decoding errors.
    pub async fn get_by_id(&self, zone: ZoneId, id: &str) -> Result<Option<RRSet>> {
        let (name, kind) = parse_rrset_id(id)?;
        self.get_by_name_and_type(zone, name, kind).await
    }

    /// Fetch one page of record sets.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn list(
        &self,
        zone: ZoneId,
        opts: &ListOpts,
        params: &RRSetListParams,
    ) -> Result<(Vec<RRSet>, Meta)> {
        let mut query = opts.to_pairs();
        query.extend(params.to_pairs());

        let mut body: Value = self
            .inner
            .get_json(&Self::collection_path(zone), &query)
            .await?;
        let rrsets = take_field(&mut body, "rrsets")?;
        let meta = match body.get_mut("meta") {
            Some(meta) => serde_json::from_value(meta.take())?,
            None => Meta::default(),
        };
        Ok((rrsets, meta))
    }

    /// Fetch every record set of a zone.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn all(&self, zone: ZoneId, params: &RRSetListParams) -> Result<Vec<RRSet>> {
        let mut opts = ListOpts::page(1, ALL_PAGES_PER_PAGE);
        let mut all = Vec::new();
        loop {
            let (rrsets, meta) = self.list(zone, &opts, params).await?;
            all.extend(rrsets);
            match meta.next_page() {
                Some(next) => opts.page = Some(next),
                None => return Ok(all),
            }
        }
    }

    /// Create a record set.
    ///
    /// # Errors
    ///
    /// Returns validation, transport or decoding errors.
    pub async fn create(&self, zone: ZoneId, opts: &RRSetCreateOpts) -> Result<RRSetCreateResult> {
        opts.validate()?;
        self.inner
            .send_json(Method::POST, &Self::collection_path(zone), Some(opts), &[])
            .await
    }

    /// Update a record set.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn update(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
        opts: &RRSetUpdateOpts,
    ) -> Result<RRSet> {
        let mut body: Value = self
            .inner
            .send_json(Method::PUT, &Self::item_path(zone, name, kind), Some(opts), &[])
            .await?;
        take_field(&mut body, "rrset")
    }

    /// Delete a record set.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn delete(&self, zone: ZoneId, name: &str, kind: RRSetType) -> Result<ActionResult> {
        self.inner
            .send_json::<(), _>(Method::DELETE, &Self::item_path(zone, name, kind), None, &[])
            .await
    }

    async fn action<B>(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
        action: &str,
        body: &B,
    ) -> Result<ActionResult>
    where
        B: Serialize + Sync,
    {
        let path = format!("{}/actions/{action}", Self::item_path(zone, name, kind));
        self.inner
            .send_json(Method::POST, &path, Some(body), &[])
            .await
    }

    /// Replace all records.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn set_records(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
        records: &[RRSetRecord],
    ) -> Result<ActionResult> {
        let body = RecordsBody { records, ttl: None };
        self.action(zone, name, kind, "set_records", &body).await
    }

    /// Add records, creating the record set if needed.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn add_records(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
        records: &[RRSetRecord],
        ttl: Option<u32>,
    ) -> Result<ActionResult> {
        let body = RecordsBody { records, ttl };
        self.action(zone, name, kind, "add_records", &body).await
    }

    /// Remove records; the record set is deleted once empty.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn remove_records(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
        records: &[RRSetRecord],
    ) -> Result<ActionResult> {
        let body = RecordsBody { records, ttl: None };
        self.action(zone, name, kind, "remove_records", &body).await
    }

    /// Set the TTL, or fall back to the zone default with `None`.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_ttl(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
        ttl: Option<u32>,
    ) -> Result<ActionResult> {
        self.action(zone, name, kind, "change_ttl", &TtlBody { ttl })
            .await
    }

    /// Enable or disable change protection.
    ///
    /// # Errors
    ///
    /// Returns transport or decoding errors.
    pub async fn change_protection(
        &self,
        zone: ZoneId,
        name: &str,
        kind: RRSetType,
        change: bool,
    ) -> Result<ActionResult> {
        let body = ChangeProtectionBody { change };
        self.action(zone, name, kind, "change_protection", &body)
            .await
    }
}

/// Split a `<name>/<type>` ID.
///
/// # Errors
///
/// Returns [`Error::InvalidId`] if the ID has no `/` or an unknown type.
pub fn parse_rrset_id(id: &str) -> Result<(&str, RRSetType)> {
    let (name, kind) = id
        .rsplit_once('/')
        .ok_or_else(|| Error::InvalidId(id.to_string()))?;
    let kind: RRSetType = serde_json::from_value(Value::String(kind.to_uppercase()))
        .map_err(|_| Error::InvalidId(id.to_string()))?;
    if name.is_empty() {
        return Err(Error::InvalidId(id.to_string()));
    }
    Ok((name, kind))
}
