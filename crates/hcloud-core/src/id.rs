//! Strongly-typed identifiers for Hetzner Cloud resources.
//!
//! Every resource is addressed by a 64-bit integer ID. The wrappers in this module keep
//! IDs of different resource kinds apart at compile time while serializing as bare
//! integers on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Macro to generate strongly-typed ID wrapper types.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a new ID wrapper from a raw integer.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw integer ID.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Parses an ID from a string.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a valid integer ID.
            pub fn parse_str(input: &str) -> Result<Self> {
                input
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| Error::InvalidId(input.to_string()))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(wrapper: $name) -> Self {
                wrapper.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_str(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ActionId, "Action ID");
id_type!(CertificateId, "Certificate ID");
id_type!(DatacenterId, "Datacenter ID");
id_type!(FirewallId, "Firewall ID");
id_type!(FloatingIpId, "Floating IP ID");
id_type!(ImageId, "Image ID");
id_type!(IsoId, "ISO ID");
id_type!(LoadBalancerId, "Load Balancer ID");
id_type!(LoadBalancerTypeId, "Load Balancer Type ID");
id_type!(LocationId, "Location ID");
id_type!(NetworkId, "Network ID");
id_type!(PlacementGroupId, "Placement Group ID");
id_type!(PrimaryIpId, "Primary IP ID");
id_type!(ServerId, "Server ID");
id_type!(ServerTypeId, "Server Type ID");
id_type!(SshKeyId, "SSH Key ID");
id_type!(VolumeId, "Volume ID");
id_type!(ZoneId, "DNS Zone ID");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let id = ServerId::parse_str("4711").unwrap();
        assert_eq!(id.get(), 4711);
        assert_eq!(id.to_string(), "4711");
    }

    #[test]
    fn test_parse_invalid_id() {
        let err = ServerId::parse_str("my-server").unwrap_err();
        assert_eq!(err, Error::InvalidId("my-server".to_string()));
        assert!("".parse::<ActionId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let id = VolumeId::new(12);
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");

        let parsed: VolumeId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_conversions() {
        let id: ImageId = 5.into();
        let raw: i64 = id.into();
        assert_eq!(raw, 5);
    }
}
