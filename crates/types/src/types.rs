//! Core type definitions for DHCPv6 leases.
//!
//! - Identifier types (`SubnetId`, `Iaid`)
//! - Client identity (`Duid`)
//! - Lease records (`Lease6`) and their decoded relay information (`ExtendedInfo`)
//! - Index table selector (`IdentifierTable`)

use std::{fmt, net::Ipv6Addr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LeaseError, Result};

// ============================================================================
// Identifier Types
// ============================================================================

/// Generates a newtype wrapper around a numeric type for type-safe identifiers.
///
/// Each generated type provides:
/// - Standard derives: Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord
/// - Serde with `#[serde(transparent)]`
/// - `From<inner>` and `Into<inner>` conversions
/// - `Display` with a semantic prefix (e.g., `subnet:12`)
/// - `new()` constructor and `value()` accessor
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $inner:ty, $prefix:expr
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Creates a new identifier from a raw value.
            #[inline]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            #[inline]
            pub const fn value(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            #[inline]
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of the subnet (link) a lease was allocated from.
    ///
    /// # Display
    ///
    /// Formats with `subnet:` prefix: `subnet:7`.
    SubnetId, u32, "subnet"
);

define_id!(
    /// Identity association identifier chosen by the client.
    ///
    /// # Display
    ///
    /// Formats with `iaid:` prefix: `iaid:123`.
    Iaid, u32, "iaid"
);

// ============================================================================
// DUID
// ============================================================================

/// Maximum DUID length in bytes (RFC 8415 §11.1).
pub const MAX_DUID_LENGTH: usize = 128;

/// DHCP unique identifier of a client or relay.
///
/// Always between 1 and [`MAX_DUID_LENGTH`] bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Duid(Vec<u8>);

impl Duid {
    /// Creates a DUID from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidDuid`] if `bytes` is empty or longer than
    /// [`MAX_DUID_LENGTH`].
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(LeaseError::InvalidDuid { reason: "DUID is empty".to_string() });
        }
        if bytes.len() > MAX_DUID_LENGTH {
            return Err(LeaseError::InvalidDuid {
                reason: format!(
                    "DUID is {} bytes, maximum is {MAX_DUID_LENGTH}",
                    bytes.len()
                ),
            });
        }
        Ok(Self(bytes))
    }

    /// Returns the raw DUID bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for Duid {
    type Error = LeaseError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::new(bytes)
    }
}

impl From<Duid> for Vec<u8> {
    fn from(duid: Duid) -> Self {
        duid.0
    }
}

impl AsRef<[u8]> for Duid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Duid {
    /// Colon-separated lowercase hex, e.g. `00:01:02`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Duid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duid({self})")
    }
}

// ============================================================================
// Extended-info index tables
// ============================================================================

/// Selects one of the two extended-info index tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierTable {
    /// Relay identifier (the relay agent's own DUID, RFC 5460 relay-id option).
    Relay,
    /// Remote identifier (RFC 4649 remote-id option supplied by the relay).
    Remote,
}

impl IdentifierTable {
    /// Both tables, relay first.
    pub const ALL: [IdentifierTable; 2] = [IdentifierTable::Relay, IdentifierTable::Remote];

    /// Short name used in logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            IdentifierTable::Relay => "relay-id",
            IdentifierTable::Remote => "remote-id",
        }
    }
}

impl fmt::Display for IdentifierTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Leases
// ============================================================================

/// Lease assignment type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeaseType {
    /// Non-temporary address.
    #[default]
    Na,
    /// Temporary address.
    Ta,
    /// Delegated prefix.
    Pd,
}

impl fmt::Display for LeaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaseType::Na => f.write_str("IA_NA"),
            LeaseType::Ta => f.write_str("IA_TA"),
            LeaseType::Pd => f.write_str("IA_PD"),
        }
    }
}

/// One relay hop of a relayed client message, in decoded form.
///
/// Identifier options are already extracted from the relay-forward message by
/// the protocol layer; only their payload bytes are kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct RelayInfo {
    /// Hop count from the relay-forward header.
    #[builder(default)]
    pub hop: u8,
    /// Link address from the relay-forward header.
    #[builder(default = Ipv6Addr::UNSPECIFIED)]
    pub link_addr: Ipv6Addr,
    /// Peer address from the relay-forward header.
    #[builder(default = Ipv6Addr::UNSPECIFIED)]
    pub peer_addr: Ipv6Addr,
    /// Payload of the relay-id option, if the relay sent one.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hex")]
    pub relay_id: Option<Vec<u8>>,
    /// Payload of the remote-id option, if the relay sent one.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hex")]
    pub remote_id: Option<Vec<u8>>,
}

/// Relay information attached to a lease, innermost relay last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedInfo {
    /// Relay hops in the order they appear in the client message.
    pub relays: Vec<RelayInfo>,
}

impl ExtendedInfo {
    /// Creates extended info from a list of relay hops.
    pub fn new(relays: Vec<RelayInfo>) -> Self {
        Self { relays }
    }

    /// Returns every non-empty identifier carried for the given table.
    pub fn identifiers(&self, table: IdentifierTable) -> impl Iterator<Item = &[u8]> {
        self.relays
            .iter()
            .filter_map(move |relay| match table {
                IdentifierTable::Relay => relay.relay_id.as_deref(),
                IdentifierTable::Remote => relay.remote_id.as_deref(),
            })
            .filter(|id| !id.is_empty())
    }
}

/// An IPv6 lease.
///
/// Leases are plain values: the store hands out clones, never references into
/// its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct Lease6 {
    /// Leased address (or delegated prefix).
    pub address: Ipv6Addr,
    /// Assignment type.
    #[builder(default)]
    pub lease_type: LeaseType,
    /// Prefix length, 128 for addresses.
    #[builder(default = 128)]
    pub prefix_len: u8,
    /// Owning client.
    pub duid: Duid,
    /// Identity association the lease belongs to.
    #[builder(default)]
    pub iaid: Iaid,
    /// Preferred lifetime in seconds.
    #[builder(default)]
    pub preferred_lft: u32,
    /// Valid lifetime in seconds.
    #[builder(default)]
    pub valid_lft: u32,
    /// Client last transmission time.
    #[builder(default = Utc::now())]
    pub cltt: DateTime<Utc>,
    /// Subnet the lease was allocated from.
    #[builder(default)]
    pub subnet_id: SubnetId,
    /// Client hostname, if one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Decoded relay information, if the client message was relayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_info: Option<ExtendedInfo>,
}

/// Hex (de)serialization of optional identifier bytes.
mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| hex::decode(s).map_err(serde::de::Error::custom)).transpose()
    }
}
