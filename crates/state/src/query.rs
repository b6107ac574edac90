//! Cursor-paginated lease queries.
//!
//! Every query returns owned leases in strictly ascending address order:
//!
//! ```text
//! candidates (index table or lease store)
//!     ├── restrict to (cursor, link end]      range scan, never a full sort
//!     ├── resolve address → lease             stale index entries skipped
//!     └── take page_size
//! ```
//!
//! A link is a contiguous address range, so the link filter and the cursor
//! collapse into one range bound on the ordered candidates. Resuming with the
//! last returned address as the cursor visits every match exactly once, as
//! long as no lease is inserted at or below the cursor between calls.

use std::{net::Ipv6Addr, ops::Bound};

use lease6_types::{IdentifierTable, Lease6, LeasePageSize, LinkFilter, is_zero};

use crate::{extended_info::ExtendedInfoIndex, lease_store::LeaseStore};

/// Address bounds of a page: after `cursor`, within `link`.
///
/// Returns `None` when no address can satisfy both, which is also the case
/// that would make an ordered-range scan panic.
fn page_bounds(cursor: Ipv6Addr, link: &LinkFilter) -> Option<(Bound<Ipv6Addr>, Bound<Ipv6Addr>)> {
    let first = link.first_address();
    let last = link.last_address();

    if is_zero(cursor) || cursor < first {
        return Some((Bound::Included(first), Bound::Included(last)));
    }
    if cursor >= last {
        return None;
    }
    Some((Bound::Excluded(cursor), Bound::Included(last)))
}

/// Read-only query view over a lease store and its extended-info tables.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    leases: &'a LeaseStore,
    index: &'a ExtendedInfoIndex,
}

impl<'a> QueryEngine<'a> {
    /// Creates a query view.
    pub fn new(leases: &'a LeaseStore, index: &'a ExtendedInfoIndex) -> Self {
        Self { leases, index }
    }

    /// Returns leases indexed under `identifier` in the named table.
    ///
    /// Candidates come from the table, restricted to `link` and to addresses
    /// strictly above `cursor`, then resolved against the lease store. Index
    /// entries whose lease no longer exists are skipped. Unknown identifiers
    /// yield an empty page.
    pub fn by_identifier(
        &self,
        table: IdentifierTable,
        identifier: &[u8],
        link: &LinkFilter,
        cursor: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Vec<Lease6> {
        let Some(bounds) = page_bounds(cursor, link) else {
            return Vec::new();
        };

        self.index
            .table(table)
            .addresses_in(identifier, bounds)
            .filter_map(|address| {
                let lease = self.leases.get(address);
                if lease.is_none() {
                    tracing::trace!(
                        table = %table,
                        address = %address,
                        "Skipping extended info entry without a lease"
                    );
                }
                lease
            })
            .take(page_size.get())
            .cloned()
            .collect()
    }

    /// Returns leases relayed by the relay with `relay_id`.
    pub fn by_relay_identifier(
        &self,
        relay_id: &[u8],
        link: &LinkFilter,
        cursor: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Vec<Lease6> {
        self.by_identifier(IdentifierTable::Relay, relay_id, link, cursor, page_size)
    }

    /// Returns leases relayed on behalf of the remote system with `remote_id`.
    pub fn by_remote_identifier(
        &self,
        remote_id: &[u8],
        link: &LinkFilter,
        cursor: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Vec<Lease6> {
        self.by_identifier(IdentifierTable::Remote, remote_id, link, cursor, page_size)
    }

    /// Returns leases on `link` with address strictly above `cursor`.
    ///
    /// An unrestricted link pages over the whole store.
    pub fn by_link(
        &self,
        link: &LinkFilter,
        cursor: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Vec<Lease6> {
        let Some(bounds) = page_bounds(cursor, link) else {
            return Vec::new();
        };

        self.leases.range(bounds).take(page_size.get()).cloned().collect()
    }
}
