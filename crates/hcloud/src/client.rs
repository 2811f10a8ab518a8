use std::time::Duration;

use hcloud_actions::ActionClient;
use hcloud_compute::{
    DatacenterClient, ImageClient, IsoClient, LocationClient, PlacementGroupClient,
    ServerClient, ServerTypeClient, SshKeyClient,
};
use hcloud_core::{HcloudConfig, Result, RetryPolicy, ServiceClient};
use hcloud_dns::{RRSetClient, ZoneClient};
use hcloud_network::{
    CertificateClient, FirewallClient, FloatingIpClient, LoadBalancerClient,
    LoadBalancerTypeClient, NetworkClient, PrimaryIpClient,
};
use hcloud_storage::VolumeClient;
use tracing::debug;

/// Entry point bundling one client per resource kind.
///
/// All clients share a single transport, so cloning a `Client` is cheap and clones share
/// the connection pool and rate-limit state.
#[derive(Debug, Clone)]
pub struct Client {
    service: ServiceClient,
    actions: ActionClient,
    certificates: CertificateClient,
    datacenters: DatacenterClient,
    firewalls: FirewallClient,
    floating_ips: FloatingIpClient,
    images: ImageClient,
    isos: IsoClient,
    load_balancers: LoadBalancerClient,
    load_balancer_types: LoadBalancerTypeClient,
    locations: LocationClient,
    networks: NetworkClient,
    placement_groups: PlacementGroupClient,
    primary_ips: PrimaryIpClient,
    rrsets: RRSetClient,
    servers: ServerClient,
    server_types: ServerTypeClient,
    ssh_keys: SshKeyClient,
    volumes: VolumeClient,
    zones: ZoneClient,
}

impl Client {
    /// Client for the default endpoint with the given token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::builder().with_token(token).build()
    }

    /// Start configuring a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Client configured from `HCLOUD_TOKEN`, `HCLOUD_ENDPOINT` and `HCLOUD_POLL_INTERVAL`
    /// or their `_FILE` variants.
    ///
    /// # Errors
    ///
    /// Returns [`hcloud_core::Error::ConfigError`] if the environment is unreadable or
    /// invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&HcloudConfig::from_env()?)
    }

    /// Client for an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &HcloudConfig) -> Result<Self> {
        let service = config.client_builder()?.build()?;
        debug!(endpoint = %service.base_url(), "hcloud client ready");
        Ok(Self::from_service(service))
    }

    /// Client on top of an existing transport.
    #[must_use]
    pub fn from_service(service: ServiceClient) -> Self {
        Self {
            actions: ActionClient::new(service.clone()),
            certificates: CertificateClient::new(service.clone()),
            datacenters: DatacenterClient::new(service.clone()),
            firewalls: FirewallClient::new(service.clone()),
            floating_ips: FloatingIpClient::new(service.clone()),
            images: ImageClient::new(service.clone()),
            isos: IsoClient::new(service.clone()),
            load_balancers: LoadBalancerClient::new(service.clone()),
            load_balancer_types: LoadBalancerTypeClient::new(service.clone()),
            locations: LocationClient::new(service.clone()),
            networks: NetworkClient::new(service.clone()),
            placement_groups: PlacementGroupClient::new(service.clone()),
            primary_ips: PrimaryIpClient::new(service.clone()),
            rrsets: RRSetClient::new(service.clone()),
            servers: ServerClient::new(service.clone()),
            server_types: ServerTypeClient::new(service.clone()),
            ssh_keys: SshKeyClient::new(service.clone()),
            volumes: VolumeClient::new(service.clone()),
            zones: ZoneClient::new(service.clone()),
            service,
        }
    }

    /// The shared transport.
    #[must_use]
    pub fn service(&self) -> &ServiceClient {
        &self.service
    }

    /// Actions and waiting.
    #[must_use]
    pub fn actions(&self) -> &ActionClient {
        &self.actions
    }

    /// TLS certificates.
    #[must_use]
    pub fn certificates(&self) -> &CertificateClient {
        &self.certificates
    }

    /// Datacenters.
    #[must_use]
    pub fn datacenters(&self) -> &DatacenterClient {
        &self.datacenters
    }

    /// Firewalls.
    #[must_use]
    pub fn firewalls(&self) -> &FirewallClient {
        &self.firewalls
    }

    /// Floating IPs.
    #[must_use]
    pub fn floating_ips(&self) -> &FloatingIpClient {
        &self.floating_ips
    }

    /// Images.
    #[must_use]
    pub fn images(&self) -> &ImageClient {
        &self.images
    }

    /// ISOs.
    #[must_use]
    pub fn isos(&self) -> &IsoClient {
        &self.isos
    }

    /// Load balancers.
    #[must_use]
    pub fn load_balancers(&self) -> &LoadBalancerClient {
        &self.load_balancers
    }

    /// Load balancer types.
    #[must_use]
    pub fn load_balancer_types(&self) -> &LoadBalancerTypeClient {
        &self.load_balancer_types
    }

    /// Locations.
    #[must_use]
    pub fn locations(&self) -> &LocationClient {
        &self.locations
    }

    /// Private networks.
    #[must_use]
    pub fn networks(&self) -> &NetworkClient {
        &self.networks
    }

    /// Placement groups.
    #[must_use]
    pub fn placement_groups(&self) -> &PlacementGroupClient {
        &self.placement_groups
    }

    /// Primary IPs.
    #[must_use]
    pub fn primary_ips(&self) -> &PrimaryIpClient {
        &self.primary_ips
    }

    /// DNS record sets.
    #[must_use]
    pub fn rrsets(&self) -> &RRSetClient {
        &self.rrsets
    }

    /// Servers.
    #[must_use]
    pub fn servers(&self) -> &ServerClient {
        &self.servers
    }

    /// Server types.
    #[must_use]
    pub fn server_types(&self) -> &ServerTypeClient {
        &self.server_types
    }

    /// SSH keys.
    #[must_use]
    pub fn ssh_keys(&self) -> &SshKeyClient {
        &self.ssh_keys
    }

    /// Volumes.
    #[must_use]
    pub fn volumes(&self) -> &VolumeClient {
        &self.volumes
    }

    /// DNS zones.
    #[must_use]
    pub fn zones(&self) -> &ZoneClient {
        &self.zones
    }
}

/// Builder for [`Client`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: HcloudConfig,
    retry_policy: Option<RetryPolicy>,
}

impl ClientBuilder {
    /// Start from an existing configuration.
    #[must_use]
    pub fn from_config(config: HcloudConfig) -> Self {
        Self {
            config,
            retry_policy: None,
        }
    }

    /// Set the API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config = self.config.with_token(token);
        self
    }

    /// Set the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config = self.config.with_endpoint(endpoint);
        self
    }

    /// Set the action poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_poll_interval(interval);
        self
    }

    /// Identify the calling application in the user agent.
    #[must_use]
    pub fn with_application(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.config = self.config.with_application(name, version);
        self
    }

    /// Replace the retry policy derived from the configuration.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let mut builder = self.config.client_builder()?;
        if let Some(policy) = self.retry_policy {
            builder = builder.with_retry_policy(policy);
        }
        Ok(Client::from_service(builder.build()?))
    }
}
