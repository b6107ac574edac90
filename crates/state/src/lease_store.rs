//! Primary lease table keyed by address.
//!
//! A `BTreeMap` over [`Ipv6Addr`] keeps leases in ascending numeric address
//! order, which is the iteration contract the query engine pages over.

use std::{collections::BTreeMap, net::Ipv6Addr, ops::RangeBounds};

use lease6_types::{Lease6, LeaseError, Result};

/// Ordered in-memory table of IPv6 leases.
#[derive(Debug, Default, Clone)]
pub struct LeaseStore {
    leases: BTreeMap<Ipv6Addr, Lease6>,
}

impl LeaseStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the lease at its address.
    ///
    /// Returns the lease previously stored at that address, if any.
    pub fn insert(&mut self, lease: Lease6) -> Option<Lease6> {
        self.leases.insert(lease.address, lease)
    }

    /// Inserts the lease only if its address is free.
    ///
    /// Returns `false` and leaves the store untouched when a lease already
    /// exists for the address.
    pub fn add(&mut self, lease: Lease6) -> bool {
        match self.leases.entry(lease.address) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(lease);
                true
            },
        }
    }

    /// Replaces an existing lease, returning the previous version.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::LeaseNotFound`] if no lease exists for the address.
    pub fn update(&mut self, lease: Lease6) -> Result<Lease6> {
        match self.leases.get_mut(&lease.address) {
            Some(existing) => Ok(std::mem::replace(existing, lease)),
            None => Err(LeaseError::LeaseNotFound { address: lease.address }),
        }
    }

    /// Removes the lease at `address`.
    pub fn remove(&mut self, address: Ipv6Addr) -> Option<Lease6> {
        self.leases.remove(&address)
    }

    /// Returns the lease at `address`.
    pub fn get(&self, address: Ipv6Addr) -> Option<&Lease6> {
        self.leases.get(&address)
    }

    /// Returns `true` if a lease exists at `address`.
    pub fn contains(&self, address: Ipv6Addr) -> bool {
        self.leases.contains_key(&address)
    }

    /// Iterates leases whose address falls within `range`, ascending.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`BTreeMap::range`]: start after
    /// end, or equal bounds that are both excluded.
    pub fn range<R>(&self, range: R) -> impl DoubleEndedIterator<Item = &Lease6>
    where
        R: RangeBounds<Ipv6Addr>,
    {
        self.leases.range(range).map(|(_, lease)| lease)
    }

    /// Iterates leases with address strictly greater than `cursor`, ascending.
    pub fn range_after(&self, cursor: Ipv6Addr) -> impl Iterator<Item = &Lease6> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.range((Excluded(cursor), Unbounded))
    }

    /// Iterates leases with address greater than or equal to `start`, ascending.
    pub fn range_from(&self, start: Ipv6Addr) -> impl Iterator<Item = &Lease6> {
        self.range(start..)
    }

    /// Iterates all leases in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = &Lease6> {
        self.leases.values()
    }

    /// Number of stored leases.
    pub fn len(&self) -> usize {
        self.leases.len()
    }

    /// Returns `true` if the store holds no leases.
    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }

    /// Removes every lease.
    pub fn clear(&mut self) {
        self.leases.clear();
    }
}
