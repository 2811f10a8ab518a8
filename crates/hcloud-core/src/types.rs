//! Schema types shared across resource kinds.
//!
//! Locations, deprecation records, protection flags and list metadata appear in the
//! payloads of many resources and therefore live next to the transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::id::LocationId;
use crate::resource::Resource;

/// User-defined key/value labels attached to a resource.
pub type Labels = HashMap<String, String>;

/// A physical location where resources can be placed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Location ID.
    pub id: LocationId,
    /// Unique name, e.g. `fsn1`.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default)]
    pub country: String,
    /// City name.
    #[serde(default)]
    pub city: String,
    /// Latitude of the city.
    #[serde(default)]
    pub latitude: f64,
    /// Longitude of the city.
    #[serde(default)]
    pub longitude: f64,
    /// Network zone the location belongs to, e.g. `eu-central`.
    #[serde(default)]
    pub network_zone: String,
}

impl Resource for Location {
    type Id = LocationId;
    const SINGULAR: &'static str = "location";
    const PLURAL: &'static str = "locations";
    const PATH: &'static str = "locations";
}

/// Announcement that a resource kind will stop being orderable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeprecationInfo {
    /// When the deprecation was announced.
    pub announced: DateTime<Utc>,
    /// After this instant the resource can no longer be ordered.
    pub unavailable_after: DateTime<Utc>,
}

impl DeprecationInfo {
    /// Returns true once the deprecation has been announced.
    #[must_use]
    pub fn is_deprecated_at(&self, now: DateTime<Utc>) -> bool {
        self.announced <= now
    }

    /// Returns true once the resource is deprecated and its end-of-order date has passed.
    #[must_use]
    pub fn is_unavailable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_deprecated_at(now) && self.unavailable_after <= now
    }
}

/// Deletion/rebuild protection flags.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Protection {
    /// Resource cannot be deleted while set.
    #[serde(default)]
    pub delete: bool,
    /// Resource cannot be rebuilt while set (servers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuild: Option<bool>,
}

/// Price of a resource in one location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    /// Price without VAT.
    pub net: String,
    /// Price including VAT.
    pub gross: String,
}

/// Reverse DNS entry for an IP address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsPtr {
    /// IP address the entry belongs to.
    pub ip: String,
    /// Hostname the address resolves to.
    pub dns_ptr: String,
}

/// Pagination details of a list response.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Current page.
    pub page: u32,
    /// Entries per page.
    pub per_page: u32,
    /// Previous page, if any.
    #[serde(default)]
    pub previous_page: Option<u32>,
    /// Next page, if any.
    #[serde(default)]
    pub next_page: Option<u32>,
    /// Last page, if known.
    #[serde(default)]
    pub last_page: Option<u32>,
    /// Total number of entries, if known.
    #[serde(default)]
    pub total_entries: Option<u32>,
}

/// Metadata attached to list responses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    /// Pagination information.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl Meta {
    /// Returns the next page to fetch, if any.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        self.pagination.and_then(|p| p.next_page)
    }
}
