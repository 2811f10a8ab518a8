//! Request bodies and enums shared by several network resources.

use hcloud_core::id::NetworkId;
use serde::{Deserialize, Serialize};

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpType {
    /// A single IPv4 address.
    Ipv4,
    /// An IPv6 /64 network.
    Ipv6,
}

impl std::fmt::Display for IpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangeProtectionBody {
    pub delete: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DnsPtrBody<'a> {
    pub ip: &'a str,
    pub dns_ptr: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NetworkBody {
    pub network: NetworkId,
}
