//! # hcloud
//!
//! Typed client for the Hetzner Cloud API.
//!
//! [`Client`] bundles one client per resource kind on top of a shared transport. The
//! per-kind crates are re-exported so their models and options are reachable from here.
//!
//! ```no_run
//! use hcloud::Client;
//! use hcloud::compute::server::ServerCreateOpts;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> hcloud::Result<()> {
//! let client = Client::from_env()?;
//! let created = client
//!     .servers()
//!     .create(&ServerCreateOpts {
//!         name: "web-1".to_string(),
//!         server_type: "cx22".to_string(),
//!         image: "ubuntu-24.04".to_string(),
//!         ..ServerCreateOpts::default()
//!     })
//!     .await?;
//! let mut actions = created.actions();
//! client
//!     .actions()
//!     .wait_for(&CancellationToken::new(), &mut actions)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;

pub use client::{Client, ClientBuilder};

pub use hcloud_actions as actions;
pub use hcloud_compute as compute;
pub use hcloud_core as core;
pub use hcloud_dns as dns;
pub use hcloud_network as network;
pub use hcloud_storage as storage;

pub use hcloud_core::{Error, HcloudConfig, ListOpts, ListParams};

/// Result type alias for API operations.
pub type Result<T> = hcloud_core::Result<T>;
