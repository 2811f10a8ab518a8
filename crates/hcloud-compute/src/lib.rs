//! # hcloud-compute
//!
//! Clients for the compute side of the Hetzner Cloud API: servers and the resources they
//! are built from.
//!
//! ## Modules
//!
//! - [`server`] - Servers and their actions
//! - [`server_type`] - Server types
//! - [`image`] - Images and snapshots
//! - [`iso`] - ISO images
//! - [`ssh_key`] - SSH keys
//! - [`placement_group`] - Placement groups
//! - [`location`] - Locations
//! - [`datacenter`] - Datacenters
//! - [`deprecation`] - Human-readable deprecation warnings

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod datacenter;
pub mod deprecation;
pub mod image;
pub mod iso;
pub mod location;
pub mod placement_group;
pub mod server;
pub mod server_type;
pub mod ssh_key;

pub use datacenter::{Datacenter, DatacenterClient};
pub use deprecation::{analyze_image, analyze_server_type, DeprecationWarning};
pub use image::{Image, ImageClient};
pub use iso::{Iso, IsoClient};
pub use location::LocationClient;
pub use placement_group::{PlacementGroup, PlacementGroupClient};
pub use server::{Server, ServerClient};
pub use server_type::{ServerType, ServerTypeClient};
pub use ssh_key::{SshKey, SshKeyClient};

/// Result type alias for compute operations.
pub type Result<T> = hcloud_core::Result<T>;
