//! # hcloud-storage
//!
//! Client for block storage volumes of the Hetzner Cloud API.
//!
//! ## Modules
//!
//! - [`volume`] - Volumes and their attachment to servers

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod volume;

pub use volume::{Volume, VolumeClient, VolumeCreateOpts, VolumeCreateResult};

/// Result type alias for storage operations.
pub type Result<T> = hcloud_core::Result<T>;

#[cfg(test)]
pub(crate) mod test_support {
    use hcloud_core::{RetryPolicy, ServiceClient, ServiceClientBuilder};
    use wiremock::MockServer;

    pub fn service(server: &MockServer) -> ServiceClient {
        ServiceClientBuilder::new(server.uri())
            .unwrap()
            .with_token("token")
            .with_retry_policy(RetryPolicy::no_retry())
            .build()
            .unwrap()
    }

    pub fn action_json(id: i64, command: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "command": command,
            "status": "running",
            "progress": 0,
            "started": "2016-01-30T23:55:00+00:00",
            "finished": null,
            "resources": [],
            "error": null
        })
    }
}
