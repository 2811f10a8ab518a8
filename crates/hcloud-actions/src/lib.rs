//! # hcloud-actions
//!
//! Tracking of asynchronous Hetzner Cloud actions.
//!
//! Most mutations return an action that completes in the background. This crate decodes
//! actions, waits for them to finish and reports their combined progress.
//!
//! ## Example
//!
//! ```no_run
//! use hcloud_actions::ActionClient;
//! use hcloud_core::ServiceClientBuilder;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(mut actions: Vec<hcloud_actions::Action>) -> hcloud_core::Result<()> {
//! let service = ServiceClientBuilder::new("https://api.hetzner.cloud/v1")?
//!     .with_token("my-token")
//!     .build()?;
//! let client = ActionClient::new(service);
//! client.wait_for(&CancellationToken::new(), &mut actions).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod models;
pub mod waiter;

pub use client::ActionClient;
pub use models::{
    splice_actions, Action, ActionList, ActionListParams, ActionResource, ActionResult,
    ActionStatus, ResourceKind,
};
pub use waiter::{ActionFetcher, ActionWaiter, ProgressReceivers};

/// Result type alias for action operations.
pub type Result<T> = hcloud_core::Result<T>;
