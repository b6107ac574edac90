//! Proptest strategies for lease6 domain types.
//!
//! Addresses are drawn from a handful of slots on two adjacent /64 links and
//! identifiers from a small pool, so generated operation sequences collide on
//! the same (identifier, address) pairs often enough to exercise idempotence
//! and purging.
//!
//! # Usage
//!
//! ```no_run
//! use lease6_test_utils::strategies;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_property(ops in strategies::arb_lease_op_sequence()) {
//!         // replay ops against a manager and check an invariant
//!     }
//! }
//! ```

use std::net::Ipv6Addr;

use lease6_state::LeaseManager;
use lease6_types::{
    Duid, ExtendedInfo, Iaid, Lease6, LeasePageSize, RelayInfo, Result, SubnetId,
};
use proptest::prelude::*;

/// First link: `2001:db8::/64`.
pub const LINK_A: Ipv6Addr = Ipv6Addr::new(0x2001, 0x0db8, 0, 0, 0, 0, 0, 0);

/// Second link: `2001:db8:0:1::/64`, numerically right after [`LINK_A`].
pub const LINK_B: Ipv6Addr = Ipv6Addr::new(0x2001, 0x0db8, 0, 1, 0, 0, 0, 0);

/// Prefix length of [`LINK_A`] and [`LINK_B`].
pub const LINK_PREFIX_LEN: u8 = 64;

/// Number of address slots generated per link.
pub const SLOTS_PER_LINK: u16 = 16;

/// Generates an address in one of the first [`SLOTS_PER_LINK`] slots of `link`.
pub fn arb_address_in(link: Ipv6Addr) -> impl Strategy<Value = Ipv6Addr> {
    (0..SLOTS_PER_LINK).prop_map(move |slot| Ipv6Addr::from(u128::from(link) + u128::from(slot)))
}

/// Generates an address on [`LINK_A`] or [`LINK_B`].
pub fn arb_address() -> impl Strategy<Value = Ipv6Addr> {
    prop_oneof![arb_address_in(LINK_A), arb_address_in(LINK_B)]
}

/// Generates an identifier from a pool of six short byte strings.
pub fn arb_identifier() -> impl Strategy<Value = Vec<u8>> {
    prop::sample::select(vec![
        b"relay-a".to_vec(),
        b"relay-b".to_vec(),
        b"relay-c".to_vec(),
        b"remote-1".to_vec(),
        b"remote-2".to_vec(),
        vec![0x00, 0x01, 0xe5],
    ])
}

/// Generates a [`Duid`] of 1-16 random bytes.
pub fn arb_duid() -> impl Strategy<Value = Duid> {
    proptest::collection::vec(any::<u8>(), 1..=16)
        .prop_filter_map("DUID length is within bounds", |bytes| Duid::new(bytes).ok())
}

/// Generates a [`RelayInfo`] with optional pooled relay and remote identifiers.
pub fn arb_relay_info() -> impl Strategy<Value = RelayInfo> {
    (any::<u8>(), proptest::option::of(arb_identifier()), proptest::option::of(arb_identifier()))
        .prop_map(|(hop, relay_id, remote_id)| {
            RelayInfo::builder().hop(hop).maybe_relay_id(relay_id).maybe_remote_id(remote_id).build()
        })
}

/// Generates [`ExtendedInfo`] with 1-3 relay hops.
pub fn arb_extended_info() -> impl Strategy<Value = ExtendedInfo> {
    proptest::collection::vec(arb_relay_info(), 1..=3).prop_map(ExtendedInfo::new)
}

/// Generates a [`Lease6`] at an [`arb_address`], with extended info about
/// half of the time.
pub fn arb_lease() -> impl Strategy<Value = Lease6> {
    (
        arb_address(),
        arb_duid(),
        any::<u32>(),
        0u32..10_000,
        proptest::option::of(arb_extended_info()),
    )
        .prop_map(|(address, duid, iaid, subnet, extended_info)| {
            Lease6::builder()
                .address(address)
                .duid(duid)
                .iaid(Iaid::new(iaid))
                .preferred_lft(1000)
                .valid_lft(2000)
                .subnet_id(SubnetId::new(subnet))
                .maybe_extended_info(extended_info)
                .build()
        })
}

/// Generates a page size between 1 and 8.
pub fn arb_page_size() -> impl Strategy<Value = LeasePageSize> {
    (1usize..=8).prop_filter_map("page size is non-zero", |n| LeasePageSize::new(n).ok())
}

/// One mutation of a [`LeaseManager`].
#[derive(Debug, Clone)]
pub enum LeaseOp {
    /// Add a lease (refused if the address is taken).
    AddLease(Lease6),
    /// Remove a lease and its index entries.
    DeleteLease(Ipv6Addr),
    /// Index a relay identifier.
    AddRelayId(Ipv6Addr, Vec<u8>),
    /// Index a remote identifier.
    AddRemoteId(Ipv6Addr, Vec<u8>),
    /// Purge both tables for an address.
    DeleteExtendedInfo(Ipv6Addr),
}

impl LeaseOp {
    /// Applies the operation to `manager`.
    ///
    /// # Errors
    ///
    /// Propagates any error the manager returns.
    pub fn apply(&self, manager: &LeaseManager) -> Result<()> {
        match self {
            LeaseOp::AddLease(lease) => manager.add_lease(lease.clone()).map(|_| ()),
            LeaseOp::DeleteLease(address) => manager.delete_lease(*address).map(|_| ()),
            LeaseOp::AddRelayId(address, id) => manager.add_relay_id(*address, id),
            LeaseOp::AddRemoteId(address, id) => manager.add_remote_id(*address, id),
            LeaseOp::DeleteExtendedInfo(address) => {
                manager.delete_extended_info(*address).map(|_| ())
            },
        }
    }
}

/// Generates an arbitrary [`LeaseOp`], weighted towards additions.
pub fn arb_lease_op() -> impl Strategy<Value = LeaseOp> {
    prop_oneof![
        3 => arb_lease().prop_map(LeaseOp::AddLease),
        1 => arb_address().prop_map(LeaseOp::DeleteLease),
        3 => (arb_address(), arb_identifier()).prop_map(|(a, id)| LeaseOp::AddRelayId(a, id)),
        3 => (arb_address(), arb_identifier()).prop_map(|(a, id)| LeaseOp::AddRemoteId(a, id)),
        1 => arb_address().prop_map(LeaseOp::DeleteExtendedInfo),
    ]
}

/// Generates a vector of 1-64 arbitrary operations.
pub fn arb_lease_op_sequence() -> impl Strategy<Value = Vec<LeaseOp>> {
    proptest::collection::vec(arb_lease_op(), 1..64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use lease6_types::LinkFilter;

    use super::*;

    proptest! {
        #[test]
        fn strategy_produces_addresses_on_known_links(address in arb_address()) {
            let a = LinkFilter::new(LINK_A, LINK_PREFIX_LEN).unwrap();
            let b = LinkFilter::new(LINK_B, LINK_PREFIX_LEN).unwrap();
            prop_assert!(a.matches(address) != b.matches(address));
        }

        #[test]
        fn strategy_produces_non_empty_identifiers(id in arb_identifier()) {
            prop_assert!(!id.is_empty());
        }

        #[test]
        fn strategy_produces_valid_page_sizes(page in arb_page_size()) {
            prop_assert!((1..=8).contains(&page.get()));
        }

        #[test]
        fn strategy_relay_identifiers_are_non_empty(info in arb_extended_info()) {
            prop_assert!(!info.relays.is_empty());
            for id in info.identifiers(lease6_types::IdentifierTable::Relay) {
                prop_assert!(!id.is_empty());
            }
        }
    }
}
