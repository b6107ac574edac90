//! Property tests over random operation sequences.
//!
//! A simple model (a set of (identifier, address) pairs per table plus the set
//! of stored addresses) is maintained alongside the manager and used to check
//! query answers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::{
    collections::{BTreeMap, BTreeSet},
    net::Ipv6Addr,
};

use lease6_state::LeaseManager;
use lease6_test_utils::{
    addresses_of, collect_pages, fixtures,
    strategies::{
        LINK_A, LINK_B, LINK_PREFIX_LEN, LeaseOp, arb_address, arb_identifier,
        arb_lease_op_sequence, arb_page_size,
    },
};
use lease6_types::{LeasePageSize, LinkFilter, ThreadingMode, ZERO_ADDRESS};
use proptest::prelude::*;

fn manager(mode: ThreadingMode) -> LeaseManager {
    LeaseManager::new(fixtures::test_config(mode)).unwrap()
}

/// Expected state after a sequence of operations.
#[derive(Default)]
struct Model {
    leases: BTreeSet<Ipv6Addr>,
    relay: BTreeMap<Vec<u8>, BTreeSet<Ipv6Addr>>,
    remote: BTreeMap<Vec<u8>, BTreeSet<Ipv6Addr>>,
}

impl Model {
    fn purge(&mut self, address: Ipv6Addr) {
        for table in [&mut self.relay, &mut self.remote] {
            for addresses in table.values_mut() {
                addresses.remove(&address);
            }
        }
    }

    fn apply(&mut self, op: &LeaseOp) {
        match op {
            LeaseOp::AddLease(lease) => {
                if self.leases.insert(lease.address) {
                    if let Some(info) = &lease.extended_info {
                        for id in info.identifiers(lease6_types::IdentifierTable::Relay) {
                            self.relay.entry(id.to_vec()).or_default().insert(lease.address);
                        }
                        for id in info.identifiers(lease6_types::IdentifierTable::Remote) {
                            self.remote.entry(id.to_vec()).or_default().insert(lease.address);
                        }
                    }
                }
            },
            LeaseOp::DeleteLease(address) => {
                self.leases.remove(address);
                self.purge(*address);
            },
            LeaseOp::AddRelayId(address, id) => {
                self.relay.entry(id.clone()).or_default().insert(*address);
            },
            LeaseOp::AddRemoteId(address, id) => {
                self.remote.entry(id.clone()).or_default().insert(*address);
            },
            LeaseOp::DeleteExtendedInfo(address) => self.purge(*address),
        }
    }

    fn pairs(table: &BTreeMap<Vec<u8>, BTreeSet<Ipv6Addr>>) -> usize {
        table.values().map(BTreeSet::len).sum()
    }

    /// Addresses a relay query for `id` on `link` should return.
    fn relay_hits(&self, id: &[u8], link: &LinkFilter) -> Vec<Ipv6Addr> {
        self.relay
            .get(id)
            .into_iter()
            .flatten()
            .filter(|a| link.matches(**a) && self.leases.contains(*a))
            .copied()
            .collect()
    }
}

fn replay(ops: &[LeaseOp], mode: ThreadingMode) -> (LeaseManager, Model) {
    let m = manager(mode);
    let mut model = Model::default();
    for op in ops {
        op.apply(&m).unwrap();
        model.apply(op);
    }
    (m, model)
}

fn drain_relay(
    m: &LeaseManager,
    id: &[u8],
    link: Ipv6Addr,
    link_len: u8,
    page: LeasePageSize,
) -> Vec<Ipv6Addr> {
    let leases = collect_pages(page, 256, |cursor, size| {
        m.get_leases_by_relay_id(id, link, link_len, cursor, size)
    })
    .unwrap();
    addresses_of(&leases)
}

proptest! {
    /// Table sizes always equal the number of distinct pairs, and repeating an
    /// identifier add straight away never changes them.
    #[test]
    fn prop_adds_are_idempotent(ops in arb_lease_op_sequence()) {
        let m = manager(ThreadingMode::SingleThreaded);
        let mut model = Model::default();
        for op in &ops {
            op.apply(&m).unwrap();
            model.apply(op);
            if matches!(op, LeaseOp::AddRelayId(..) | LeaseOp::AddRemoteId(..)) {
                let sizes = (m.relay_id_count().unwrap(), m.remote_id_count().unwrap());
                op.apply(&m).unwrap();
                prop_assert_eq!((m.relay_id_count().unwrap(), m.remote_id_count().unwrap()), sizes);
            }
        }
        prop_assert_eq!(m.relay_id_count().unwrap(), Model::pairs(&model.relay));
        prop_assert_eq!(m.remote_id_count().unwrap(), Model::pairs(&model.remote));
    }

    /// Replaying earlier identifier adds after purges restores exactly the
    /// replayed pairs.
    #[test]
    fn prop_replayed_adds_match_model(ops in arb_lease_op_sequence()) {
        let (m, mut model) = replay(&ops, ThreadingMode::SingleThreaded);
        for op in &ops {
            if matches!(op, LeaseOp::AddRelayId(..) | LeaseOp::AddRemoteId(..)) {
                op.apply(&m).unwrap();
                model.apply(op);
            }
        }
        prop_assert_eq!(m.relay_id_count().unwrap(), Model::pairs(&model.relay));
        prop_assert_eq!(m.remote_id_count().unwrap(), Model::pairs(&model.remote));
    }

    /// After purging an address no identifier query returns it.
    #[test]
    fn prop_purge_is_complete(
        ops in arb_lease_op_sequence(),
        victim in arb_address(),
        ids in proptest::collection::vec(arb_identifier(), 1..4),
    ) {
        let (m, _) = replay(&ops, ThreadingMode::SingleThreaded);
        for id in &ids {
            m.add_relay_id(victim, id).unwrap();
            m.add_remote_id(victim, id).unwrap();
        }
        m.delete_extended_info(victim).unwrap();

        let page = LeasePageSize::new(100).unwrap();
        for id in &ids {
            let relay = m.get_leases_by_relay_id(id, ZERO_ADDRESS, 0, ZERO_ADDRESS, page).unwrap();
            let remote = m.get_leases_by_remote_id(id, ZERO_ADDRESS, 0, ZERO_ADDRESS, page).unwrap();
            prop_assert!(relay.iter().chain(&remote).all(|lease| lease.address != victim));
        }
    }

    /// Chained pages visit exactly the model's matches, once each, ascending.
    #[test]
    fn prop_pagination_is_complete(
        ops in arb_lease_op_sequence(),
        id in arb_identifier(),
        page in arb_page_size(),
        on_link_b in any::<bool>(),
    ) {
        let (m, model) = replay(&ops, ThreadingMode::SingleThreaded);

        let unrestricted = drain_relay(&m, &id, ZERO_ADDRESS, 0, page);
        prop_assert_eq!(&unrestricted, &model.relay_hits(&id, &LinkFilter::ANY));

        let link = if on_link_b { LINK_B } else { LINK_A };
        let filter = LinkFilter::new(link, LINK_PREFIX_LEN).unwrap();
        let on_link = drain_relay(&m, &id, link, LINK_PREFIX_LEN, page);
        prop_assert!(on_link.iter().all(|a| filter.matches(*a)));
        prop_assert_eq!(&on_link, &model.relay_hits(&id, &filter));
    }

    /// Link queries return every stored lease on the link and nothing else.
    #[test]
    fn prop_link_filter_is_exact(ops in arb_lease_op_sequence(), page in arb_page_size()) {
        let (m, model) = replay(&ops, ThreadingMode::SingleThreaded);

        for link in [LINK_A, LINK_B] {
            let filter = LinkFilter::new(link, LINK_PREFIX_LEN).unwrap();
            let got = collect_pages(page, 256, |cursor, size| {
                m.get_leases_by_link(link, LINK_PREFIX_LEN, cursor, size)
            })
            .unwrap();
            let expected: Vec<Ipv6Addr> =
                model.leases.iter().copied().filter(|a| filter.matches(*a)).collect();
            prop_assert_eq!(addresses_of(&got), expected);
        }
    }

    /// Single-threaded and multi-threaded managers answer identically.
    #[test]
    fn prop_threading_modes_agree(
        ops in arb_lease_op_sequence(),
        id in arb_identifier(),
        page in arb_page_size(),
    ) {
        let (single, _) = replay(&ops, ThreadingMode::SingleThreaded);
        let (multi, _) = replay(&ops, ThreadingMode::MultiThreaded);

        prop_assert_eq!(single.get_leases().unwrap(), multi.get_leases().unwrap());
        prop_assert_eq!(single.relay_id_count().unwrap(), multi.relay_id_count().unwrap());
        prop_assert_eq!(single.remote_id_count().unwrap(), multi.remote_id_count().unwrap());
        prop_assert_eq!(
            drain_relay(&single, &id, LINK_A, LINK_PREFIX_LEN, page),
            drain_relay(&multi, &id, LINK_A, LINK_PREFIX_LEN, page)
        );
    }

    /// Rebuilding from lease payloads reproduces what lease adds indexed.
    #[test]
    fn prop_rebuild_matches_lease_payloads(ops in arb_lease_op_sequence()) {
        let m = manager(ThreadingMode::SingleThreaded);
        for op in ops.iter().filter(|op| matches!(op, LeaseOp::AddLease(_) | LeaseOp::DeleteLease(_))) {
            op.apply(&m).unwrap();
        }
        let relay = m.relay_id_count().unwrap();
        let remote = m.remote_id_count().unwrap();

        m.wipe_extended_info_tables().unwrap();
        m.rebuild_extended_info_tables().unwrap();
        prop_assert_eq!(m.relay_id_count().unwrap(), relay);
        prop_assert_eq!(m.remote_id_count().unwrap(), remote);
    }
}
