//! Fuzz target for extended-info table maintenance and paged queries.
//!
//! Decodes the input into a sequence of adds, purges, lease adds and deletes
//! against a small address and identifier space, then checks that every
//! identifier and link query pages through its matches in strictly
//! ascending order without repeats, and that purged addresses never
//! reappear.

#![no_main]

use std::net::Ipv6Addr;

use lease6_state::LeaseManager;
use lease6_types::{
    Duid, ExtendedInfo, Lease6, LeasePageSize, LeaseStoreConfig, RelayInfo, ThreadingMode,
    ZERO_ADDRESS,
};
use libfuzzer_sys::fuzz_target;

const IDENTIFIERS: [&[u8]; 4] = [b"relay-a", b"relay-b", b"remote-a", b"\x00\xff"];

fn address(byte: u8) -> Ipv6Addr {
    // Two /64 links, 16 slots each.
    let link = u16::from(byte >> 7);
    Ipv6Addr::new(0x2001, 0x0db8, 0, link, 0, 0, 0, u16::from(byte & 0x0f))
}

fn identifier(byte: u8) -> &'static [u8] {
    IDENTIFIERS[usize::from(byte) % IDENTIFIERS.len()]
}

fn lease(address: Ipv6Addr, id: &[u8]) -> Lease6 {
    Lease6::builder()
        .address(address)
        .duid(Duid::new(b"fuzz".to_vec()).expect("static duid"))
        .extended_info(ExtendedInfo::new(vec![
            RelayInfo::builder().relay_id(id.to_vec()).remote_id(id.to_vec()).build(),
        ]))
        .build()
}

fn drain(page: LeasePageSize, mut fetch: impl FnMut(Ipv6Addr) -> Vec<Lease6>) -> Vec<Ipv6Addr> {
    let mut cursor = ZERO_ADDRESS;
    let mut seen = Vec::new();
    loop {
        let leases = fetch(cursor);
        assert!(leases.len() <= page.get(), "page larger than requested");
        let Some(last) = leases.last() else { return seen };
        for lease in &leases {
            if let Some(previous) = seen.last() {
                assert!(lease.address > *previous, "addresses not strictly ascending");
            }
            seen.push(lease.address);
        }
        cursor = last.address;
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&header, ops)) = data.split_first() else {
        return;
    };

    let mode = ThreadingMode::from_multi_threaded(header & 1 == 1);
    let config = LeaseStoreConfig::builder()
        .threading_mode(mode)
        .extended_info_tables(header & 2 == 0)
        .build()
        .expect("valid config");
    let manager = LeaseManager::new(config).expect("create manager");
    let page = LeasePageSize::new(usize::from(header >> 2) % 5 + 1).expect("non-zero page");

    let mut purged = Vec::new();
    for op in ops.chunks_exact(3) {
        let address = address(op[1]);
        let id = identifier(op[2]);
        match op[0] % 6 {
            0 => manager.add_relay_id(address, id).expect("add relay id"),
            1 => manager.add_remote_id(address, id).expect("add remote id"),
            2 => {
                manager.delete_extended_info(address).expect("purge");
                purged.push(address);
            },
            3 => {
                manager.add_lease(lease(address, id)).expect("add lease");
            },
            4 => {
                manager.delete_lease(address).expect("delete lease");
                purged.push(address);
            },
            _ => {
                manager.update_lease(lease(address, id)).ok();
            },
        }
        if !matches!(op[0] % 6, 2 | 4) {
            purged.retain(|a| *a != address);
        }
    }

    let relay_total = manager.relay_id_count().expect("count");
    let remote_total = manager.remote_id_count().expect("count");

    for id in IDENTIFIERS {
        let relay = drain(page, |cursor| {
            manager.get_leases_by_relay_id(id, ZERO_ADDRESS, 0, cursor, page).expect("query")
        });
        let remote = drain(page, |cursor| {
            manager.get_leases_by_remote_id(id, ZERO_ADDRESS, 0, cursor, page).expect("query")
        });
        assert!(relay.len() <= relay_total && remote.len() <= remote_total);
        assert!(
            relay.iter().chain(&remote).all(|a| !purged.contains(a)),
            "purged address returned by identifier query"
        );
    }

    let all = drain(page, |cursor| manager.get_leases_paged(cursor, page).expect("query"));
    assert_eq!(all.len(), manager.lease_count().expect("count"));
    for link in [address(0x00), address(0x80)] {
        let on_link =
            drain(page, |cursor| manager.get_leases_by_link(link, 64, cursor, page).expect("query"));
        assert!(on_link.iter().all(|a| a.segments()[..4] == link.segments()[..4]));
    }
});
