//! Locations.

use hcloud_core::query::ListParams;
use hcloud_core::types::Location;
use hcloud_core::{ResourceClient, ServiceClient};

/// Read-only client for locations.
#[derive(Debug, Clone)]
pub struct LocationClient {
    resources: ResourceClient<Location>,
}

impl LocationClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(inner: ServiceClient) -> Self {
        Self {
            resources: ResourceClient::new(inner),
        }
    }

    hcloud_core::read_operations!(Location, ListParams);
}
