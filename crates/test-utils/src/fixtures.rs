//! Fixed lease data shared by scenario tests.
//!
//! Eight leases on `2001:db8::/64`, at `2001:db8::0` through `2001:db8::7`,
//! each owned by a client whose DUID doubles as a relay or remote identifier
//! in tests. Two DUIDs are deliberately equal.

use std::net::Ipv6Addr;

use chrono::{DateTime, Utc};
use lease6_state::LeaseManager;
use lease6_types::{Duid, Iaid, Lease6, LeaseStoreConfig, SubnetId, ThreadingMode};

/// Number of fixture leases.
pub const LEASE_COUNT: usize = 8;

/// Client identifiers of the fixture leases, by index.
pub const DUIDS: [&[u8]; LEASE_COUNT] = [
    b"wwwwwwww",
    b"BBBBBBBB",
    b"::::::::",
    b"0123456789acdef",
    b"BBBBBBBB",
    b"$$$$$$$$",
    b"^^^^^^^^",
    b"\xe5\xe5\xe5\xe5\xe5\xe5\xe5\xe5",
];

const BASE: u128 = 0x2001_0db8_u128 << 96;

/// Client last transmission time of every fixture lease, 2023-11-14T22:13:20Z.
pub const CLTT_SECS: i64 = 1_700_000_000;

/// [`CLTT_SECS`] as a timestamp.
#[must_use]
pub fn cltt() -> DateTime<Utc> {
    let Some(cltt) = DateTime::from_timestamp(CLTT_SECS, 0) else {
        panic!("fixture cltt {CLTT_SECS} is in range");
    };
    cltt
}

/// Address of fixture lease `i`: `2001:db8::i`.
#[must_use]
pub fn address(i: usize) -> Ipv6Addr {
    Ipv6Addr::from(BASE + i as u128)
}

/// Link address inside the fixture /64: `2001:db8::4`.
#[must_use]
pub fn link_address() -> Ipv6Addr {
    address(4)
}

/// Link address of a /64 holding no fixture lease: `2001:db8:1::4`.
#[must_use]
pub fn other_link_address() -> Ipv6Addr {
    Ipv6Addr::new(0x2001, 0x0db8, 1, 0, 0, 0, 0, 4)
}

/// Fixture identifier `i`, as raw bytes.
#[must_use]
pub fn identifier(i: usize) -> &'static [u8] {
    DUIDS[i]
}

/// Fixture lease `i`: IA_NA at [`address`]`(i)`, IAID 123, lifetimes
/// 1000/2000, subnet `i`, [`cltt`], no extended info.
///
/// # Panics
///
/// Panics if `i >= LEASE_COUNT`.
#[must_use]
pub fn test_lease(i: usize) -> Lease6 {
    let Ok(duid) = Duid::new(DUIDS[i]) else {
        panic!("fixture DUID {i} is valid");
    };
    Lease6::builder()
        .address(address(i))
        .duid(duid)
        .iaid(Iaid::new(123))
        .preferred_lft(1000)
        .valid_lft(2000)
        .cltt(cltt())
        .subnet_id(SubnetId::new(i as u32))
        .build()
}

/// Returns a configuration with extended-info tables enabled in `mode`.
#[must_use]
pub fn test_config(mode: ThreadingMode) -> LeaseStoreConfig {
    LeaseStoreConfig { threading_mode: mode, ..LeaseStoreConfig::default() }
}

/// Returns a manager holding all fixture leases and empty index tables.
///
/// # Panics
///
/// Panics if the manager rejects the configuration or a fixture lease.
#[must_use]
pub fn populated_manager(config: LeaseStoreConfig) -> LeaseManager {
    let manager = match LeaseManager::new(config) {
        Ok(manager) => manager,
        Err(e) => panic!("test config rejected: {e}"),
    };
    for i in 0..LEASE_COUNT {
        match manager.add_lease(test_lease(i)) {
            Ok(true) => {},
            Ok(false) => panic!("fixture lease {i} already present"),
            Err(e) => panic!("fixture lease {i} rejected: {e}"),
        }
    }
    manager
}
