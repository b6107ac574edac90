//! Address ordering, link prefixes, and the zero-address sentinel.
//!
//! Addresses are compared as unsigned big-endian 128-bit integers, which is
//! exactly the `Ord` implementation of [`Ipv6Addr`]. The unspecified address
//! `::` doubles as a sentinel: as a cursor it means "from the beginning", as a
//! link address it means "no link restriction".

use std::{fmt, net::Ipv6Addr};

use crate::error::{LeaseError, Result};

/// The all-zero address used as the "start" cursor and the "any link" filter.
pub const ZERO_ADDRESS: Ipv6Addr = Ipv6Addr::UNSPECIFIED;

/// Longest valid prefix length for an IPv6 address.
pub const MAX_PREFIX_LENGTH: u8 = 128;

/// Returns `true` if `address` is the zero sentinel.
#[inline]
pub fn is_zero(address: Ipv6Addr) -> bool {
    address == ZERO_ADDRESS
}

/// Network mask with the high `prefix_len` bits set.
///
/// Callers must pass `prefix_len <= 128`.
#[inline]
fn prefix_mask(prefix_len: u8) -> u128 {
    match prefix_len {
        0 => 0,
        len => u128::MAX << (u32::from(MAX_PREFIX_LENGTH - len)),
    }
}

/// Restriction of a query to the addresses of one link.
///
/// Built from a link address and a prefix length; the link address `::`
/// yields an unrestricted filter regardless of the prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFilter {
    network: u128,
    mask: u128,
    prefix_len: u8,
    unrestricted: bool,
}

impl LinkFilter {
    /// A filter that matches every address.
    pub const ANY: LinkFilter =
        LinkFilter { network: 0, mask: 0, prefix_len: 0, unrestricted: true };

    /// Creates a filter for the link containing `link_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidPrefixLength`] if `prefix_len > 128`.
    pub fn new(link_addr: Ipv6Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > MAX_PREFIX_LENGTH {
            return Err(LeaseError::InvalidPrefixLength { value: prefix_len });
        }
        if is_zero(link_addr) {
            return Ok(Self::ANY);
        }
        let mask = prefix_mask(prefix_len);
        Ok(Self { network: u128::from(link_addr) & mask, mask, prefix_len, unrestricted: false })
    }

    /// Returns `true` if `address` lies within the link.
    #[inline]
    pub fn matches(&self, address: Ipv6Addr) -> bool {
        self.unrestricted || u128::from(address) & self.mask == self.network
    }

    /// Lowest address of the link (the network address).
    pub fn first_address(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.network)
    }

    /// Highest address of the link.
    pub fn last_address(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.network | !self.mask)
    }
}

impl fmt::Display for LinkFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unrestricted {
            f.write_str("any")
        } else {
            write!(f, "{}/{}", self.first_address(), self.prefix_len)
        }
    }
}
