//! Relay-id and remote-id indexes over lease addresses.
//!
//! Provides two structurally identical tables for extended-info lookups:
//! - Relay table: "Which leases were relayed by relay X?" → addresses
//! - Remote table: "Which leases came from remote system Y?" → addresses
//!
//! Each table is a set of unique (identifier, address) pairs stored twice:
//! identifier → ordered addresses for queries, and address → identifiers so a
//! purge by address touches only that address's pairs. Entries hold addresses
//! by value; they never keep a lease alive and may outlive it until purged.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    net::Ipv6Addr,
    ops::RangeBounds,
    sync::Arc,
};

use lease6_types::{IdentifierTable, Lease6, LeaseError, Result};

/// One (identifier → addresses) table with its address → identifiers reverse map.
#[derive(Debug, Default, Clone)]
pub struct IdentifierIndex {
    by_identifier: HashMap<Arc<[u8]>, BTreeSet<Ipv6Addr>>,
    by_address: HashMap<Ipv6Addr, HashSet<Arc<[u8]>>>,
    len: usize,
}

impl IdentifierIndex {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the (identifier, address) pair if absent.
    ///
    /// Returns `true` if the pair was new. Callers guarantee `identifier` is
    /// non-empty.
    pub fn insert(&mut self, address: Ipv6Addr, identifier: &[u8]) -> bool {
        debug_assert!(!identifier.is_empty());

        let key: Arc<[u8]> = match self.by_identifier.get_key_value(identifier) {
            Some((key, addresses)) => {
                if addresses.contains(&address) {
                    return false;
                }
                Arc::clone(key)
            },
            None => Arc::from(identifier),
        };

        self.by_identifier.entry(Arc::clone(&key)).or_default().insert(address);
        self.by_address.entry(address).or_default().insert(key);
        self.len += 1;
        true
    }

    /// Removes every pair for `address`, returning how many were removed.
    pub fn remove_address(&mut self, address: Ipv6Addr) -> usize {
        let Some(identifiers) = self.by_address.remove(&address) else {
            return 0;
        };

        for identifier in &identifiers {
            if let Some(addresses) = self.by_identifier.get_mut(identifier) {
                addresses.remove(&address);
                if addresses.is_empty() {
                    self.by_identifier.remove(identifier);
                }
            }
        }

        self.len -= identifiers.len();
        identifiers.len()
    }

    /// Returns the addresses indexed under `identifier`, ascending.
    pub fn addresses(&self, identifier: &[u8]) -> impl Iterator<Item = Ipv6Addr> + '_ {
        self.by_identifier.get(identifier).into_iter().flatten().copied()
    }

    /// Returns the addresses indexed under `identifier` that fall in `range`, ascending.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`BTreeSet::range`].
    pub fn addresses_in<R>(&self, identifier: &[u8], range: R) -> impl Iterator<Item = Ipv6Addr> + '_
    where
        R: RangeBounds<Ipv6Addr>,
    {
        self.by_identifier
            .get(identifier)
            .map(|addresses| addresses.range(range))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Returns `true` if the (identifier, address) pair is present.
    pub fn contains(&self, address: Ipv6Addr, identifier: &[u8]) -> bool {
        self.by_identifier.get(identifier).is_some_and(|addresses| addresses.contains(&address))
    }

    /// Number of distinct identifiers.
    pub fn identifier_count(&self) -> usize {
        self.by_identifier.len()
    }

    /// Number of (identifier, address) pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        self.by_identifier.clear();
        self.by_address.clear();
        self.len = 0;
    }
}

/// The relay-id and remote-id tables, maintained together.
#[derive(Debug, Default, Clone)]
pub struct ExtendedInfoIndex {
    relay: IdentifierIndex,
    remote: IdentifierIndex,
}

impl ExtendedInfoIndex {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named table.
    pub fn table(&self, table: IdentifierTable) -> &IdentifierIndex {
        match table {
            IdentifierTable::Relay => &self.relay,
            IdentifierTable::Remote => &self.remote,
        }
    }

    fn table_mut(&mut self, table: IdentifierTable) -> &mut IdentifierIndex {
        match table {
            IdentifierTable::Relay => &mut self.relay,
            IdentifierTable::Remote => &mut self.remote,
        }
    }

    /// Adds the (identifier, address) pair to the named table.
    ///
    /// Idempotent: returns `Ok(false)` if the pair already exists. The lease
    /// store is not consulted, so entries may be added ahead of the lease.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidIdentifier`] if `identifier` is empty.
    pub fn add_identifier(
        &mut self,
        table: IdentifierTable,
        address: Ipv6Addr,
        identifier: &[u8],
    ) -> Result<bool> {
        if identifier.is_empty() {
            return Err(LeaseError::InvalidIdentifier {
                table,
                address,
                reason: "identifier is empty".to_string(),
            });
        }

        let added = self.table_mut(table).insert(address, identifier);
        if added {
            tracing::trace!(
                table = %table,
                address = %address,
                identifier = %hex::encode(identifier),
                "Indexed extended info"
            );
        }
        Ok(added)
    }

    /// Indexes every relay and remote identifier carried by the lease's
    /// extended info. Returns the number of new pairs.
    pub fn index_lease(&mut self, lease: &Lease6) -> usize {
        let Some(info) = &lease.extended_info else {
            return 0;
        };

        let mut added = 0;
        for table in IdentifierTable::ALL {
            let index = self.table_mut(table);
            for identifier in info.identifiers(table) {
                if index.insert(lease.address, identifier) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Removes every pair for `address` from both tables.
    ///
    /// Returns the total number of pairs removed; zero means nothing matched.
    pub fn delete_for_address(&mut self, address: Ipv6Addr) -> usize {
        self.relay.remove_address(address) + self.remote.remove_address(address)
    }

    /// Number of pairs in the named table.
    pub fn len(&self, table: IdentifierTable) -> usize {
        self.table(table).len()
    }

    /// Returns `true` if both tables are empty.
    pub fn is_empty(&self) -> bool {
        self.relay.is_empty() && self.remote.is_empty()
    }

    /// Empties both tables.
    pub fn clear(&mut self) {
        self.relay.clear();
        self.remote.clear();
    }
}
