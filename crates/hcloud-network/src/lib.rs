//! # hcloud-network
//!
//! Clients for the networking resources of the Hetzner Cloud API.
//!
//! ## Modules
//!
//! - [`network`] - Private networks, subnets and routes
//! - [`floating_ip`] - Floating IPs
//! - [`primary_ip`] - Primary IPs
//! - [`firewall`] - Firewalls
//! - [`load_balancer`] - Load balancers
//! - [`load_balancer_type`] - Load balancer types
//! - [`certificate`] - TLS certificates

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod certificate;
pub mod common;
pub mod firewall;
pub mod floating_ip;
pub mod load_balancer;
pub mod load_balancer_type;
pub mod network;
pub mod primary_ip;

pub use certificate::{Certificate, CertificateClient};
pub use common::IpType;
pub use firewall::{Firewall, FirewallClient};
pub use floating_ip::{FloatingIp, FloatingIpClient};
pub use load_balancer::{LoadBalancer, LoadBalancerClient};
pub use load_balancer_type::{LoadBalancerType, LoadBalancerTypeClient};
pub use network::{Network, NetworkClient};
pub use primary_ip::{PrimaryIp, PrimaryIpClient};

/// Result type alias for network operations.
pub type Result<T> = hcloud_core::Result<T>;
