//! # hcloud-dns
//!
//! Clients for DNS zones and record sets of the Hetzner Cloud API.
//!
//! TXT record values longer than 255 bytes have to be split into quoted chunks; the
//! [`txt`] module converts between plain text and that representation, and
//! [`RRSetRecord::txt`] / [`RRSetRecord::txt_value`] apply it to records.
//!
//! ```no_run
//! use hcloud_core::{id::ZoneId, HcloudConfig};
//! use hcloud_dns::{RRSetRecord, RRSetType, ZoneClient};
//!
//! # async fn example() -> hcloud_dns::Result<()> {
//! let service = HcloudConfig::from_env()?.client_builder()?.build()?;
//! let zones = ZoneClient::new(service);
//! let record = RRSetRecord::txt("v=spf1 include:_spf.example.com -all");
//! zones
//!     .rrsets()
//!     .set_records(ZoneId::new(42), "@", RRSetType::Txt, &[record])
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod rrset;
pub mod txt;
pub mod zone;

pub use rrset::{RRSet, RRSetClient, RRSetRecord, RRSetType};
pub use txt::{format_txt, parse_txt};
pub use zone::{Zone, ZoneClient, ZoneMode};

/// Result type alias for DNS operations.
pub type Result<T> = hcloud_core::Result<T>;
