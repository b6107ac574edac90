//! Lease manager facade.
//!
//! [`LeaseManager`] is what the rest of a DHCPv6 server talks to. It owns the
//! primary lease store and both extended-info tables behind one
//! [`ConcurrencyGuard`], so a mutation that touches the store and the tables
//! is applied as a single step in multi-threaded mode.
//!
//! Identifier and link arguments arrive as raw values (bytes, address plus
//! prefix length) and are validated here before any lock is taken.

use std::net::Ipv6Addr;

use lease6_types::{
    IdentifierTable, Lease6, LeaseError, LeasePageSize, LeaseStoreConfig, LinkFilter, Result,
    ThreadingMode, ZERO_ADDRESS,
};

use crate::{
    extended_info::ExtendedInfoIndex, guard::ConcurrencyGuard, lease_store::LeaseStore,
    query::QueryEngine,
};

/// Lease store and extended-info tables, locked together.
#[derive(Debug, Default)]
struct Tables {
    leases: LeaseStore,
    extended_info: ExtendedInfoIndex,
}

impl Tables {
    fn query(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.leases, &self.extended_info)
    }
}

/// In-memory DHCPv6 lease manager with relay-id and remote-id lookup tables.
///
/// `LeaseManager` is `Send + Sync`; share it as `Arc<LeaseManager>`.
///
/// # Example
///
/// ```no_run
/// use lease6_state::LeaseManager;
/// use lease6_types::{LeasePageSize, LeaseStoreConfig, ZERO_ADDRESS};
///
/// let manager = LeaseManager::new(LeaseStoreConfig::default())?;
/// let address = "2001:db8::1".parse()?;
/// manager.add_relay_id(address, b"relay-1")?;
///
/// let page = LeasePageSize::new(100)?;
/// let leases = manager.get_leases_by_relay_id(b"relay-1", ZERO_ADDRESS, 0, ZERO_ADDRESS, page)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct LeaseManager {
    tables: ConcurrencyGuard<Tables>,
    extended_info_tables: bool,
    max_page: LeasePageSize,
}

impl LeaseManager {
    /// Creates an empty manager.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::Config`] if `config` fails validation.
    pub fn new(config: LeaseStoreConfig) -> Result<Self> {
        config.validate()?;
        let max_page = config.max_page()?;

        tracing::debug!(
            extended_info_tables = config.extended_info_tables,
            threading_mode = %config.threading_mode,
            max_page_size = max_page.get(),
            "Created lease manager"
        );

        Ok(Self {
            tables: ConcurrencyGuard::new(Tables::default(), config.threading_mode),
            extended_info_tables: config.extended_info_tables,
            max_page,
        })
    }

    /// Returns `true` if the relay-id and remote-id tables are maintained.
    pub fn extended_info_tables_enabled(&self) -> bool {
        self.extended_info_tables
    }

    /// Current threading mode.
    pub fn threading_mode(&self) -> ThreadingMode {
        self.tables.mode()
    }

    /// Switches the threading mode.
    ///
    /// Test harnesses only: must not be called while other threads are using
    /// the manager.
    pub fn set_threading_mode(&self, mode: ThreadingMode) {
        tracing::debug!(threading_mode = %mode, "Switching threading mode");
        self.tables.set_mode(mode);
    }

    // =========================================================================
    // Leases
    // =========================================================================

    /// Adds a lease if its address is free.
    ///
    /// Returns `Ok(false)` when a lease already exists at the address. When
    /// extended-info tables are enabled the lease's relay and remote
    /// identifiers are indexed.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn add_lease(&self, lease: Lease6) -> Result<bool> {
        let index = self.extended_info_tables;
        self.tables.write("add_lease", |tables| {
            let address = lease.address;
            if tables.leases.contains(address) {
                tracing::trace!(address = %address, "Lease already exists");
                return false;
            }

            let indexed = if index { tables.extended_info.index_lease(&lease) } else { 0 };
            tables.leases.add(lease);
            tracing::trace!(address = %address, indexed, "Added lease");
            true
        })
    }

    /// Replaces an existing lease.
    ///
    /// When extended-info tables are enabled the address is purged from both
    /// tables and re-indexed from the new lease.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::LeaseNotFound`] if no lease exists at the address.
    pub fn update_lease(&self, lease: Lease6) -> Result<()> {
        let index = self.extended_info_tables;
        self.tables.write("update_lease", |tables| {
            let address = lease.address;
            tables.leases.update(lease)?;
            if index {
                reindex(tables, address);
            }
            Ok(())
        })?
    }

    /// Removes the lease at `address` and, when enabled, its index entries.
    ///
    /// Returns `Ok(false)` if no lease existed.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn delete_lease(&self, address: Ipv6Addr) -> Result<bool> {
        let index = self.extended_info_tables;
        self.tables.write("delete_lease", |tables| {
            let removed = tables.leases.remove(address).is_some();
            if index {
                tables.extended_info.delete_for_address(address);
            }
            removed
        })
    }

    /// Returns a copy of the lease at `address`.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn get_lease(&self, address: Ipv6Addr) -> Result<Option<Lease6>> {
        self.tables.read("get_lease", |tables| tables.leases.get(address).cloned())
    }

    /// Returns copies of all leases in ascending address order.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn get_leases(&self) -> Result<Vec<Lease6>> {
        self.tables.read("get_leases", |tables| tables.leases.iter().cloned().collect())
    }

    /// Number of stored leases.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn lease_count(&self) -> Result<usize> {
        self.tables.read("lease_count", |tables| tables.leases.len())
    }

    /// Returns up to `page_size` leases with address strictly above
    /// `lower_bound`, over the whole store.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn get_leases_paged(
        &self,
        lower_bound: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Result<Vec<Lease6>> {
        self.get_leases_by_link(ZERO_ADDRESS, 0, lower_bound, page_size)
    }

    // =========================================================================
    // Extended-info tables
    // =========================================================================

    /// Records that the lease at `address` was relayed by `relay_id`.
    ///
    /// Idempotent. A no-op when extended-info tables are disabled.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidIdentifier`] if `relay_id` is empty.
    pub fn add_relay_id(&self, address: Ipv6Addr, relay_id: &[u8]) -> Result<()> {
        self.add_identifier(IdentifierTable::Relay, address, relay_id)
    }

    /// Records that the lease at `address` was relayed on behalf of `remote_id`.
    ///
    /// Idempotent. A no-op when extended-info tables are disabled.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidIdentifier`] if `remote_id` is empty.
    pub fn add_remote_id(&self, address: Ipv6Addr, remote_id: &[u8]) -> Result<()> {
        self.add_identifier(IdentifierTable::Remote, address, remote_id)
    }

    fn add_identifier(
        &self,
        table: IdentifierTable,
        address: Ipv6Addr,
        identifier: &[u8],
    ) -> Result<()> {
        if identifier.is_empty() {
            return Err(LeaseError::InvalidIdentifier {
                table,
                address,
                reason: "identifier is empty".to_string(),
            });
        }
        if !self.extended_info_tables {
            return Ok(());
        }

        self.tables
            .write(table.as_str(), |tables| {
                tables.extended_info.add_identifier(table, address, identifier).map(|_| ())
            })?
    }

    /// Removes every relay-id and remote-id entry for `address`.
    ///
    /// Returns the number of entries removed. Unknown addresses and disabled
    /// tables yield zero.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn delete_extended_info(&self, address: Ipv6Addr) -> Result<usize> {
        if !self.extended_info_tables {
            return Ok(0);
        }

        let removed = self
            .tables
            .write("delete_extended_info", |tables| tables.extended_info.delete_for_address(address))?;
        tracing::debug!(address = %address, removed, "Purged extended info");
        Ok(removed)
    }

    /// Number of (relay-id, address) pairs.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn relay_id_count(&self) -> Result<usize> {
        self.tables.read("relay_id_count", |tables| tables.extended_info.len(IdentifierTable::Relay))
    }

    /// Number of (remote-id, address) pairs.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn remote_id_count(&self) -> Result<usize> {
        self.tables.read("remote_id_count", |tables| tables.extended_info.len(IdentifierTable::Remote))
    }

    /// Empties both extended-info tables. Leases are untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn wipe_extended_info_tables(&self) -> Result<()> {
        self.tables.write("wipe_extended_info_tables", |tables| tables.extended_info.clear())?;
        tracing::debug!("Wiped extended info tables");
        Ok(())
    }

    /// Rebuilds both tables from the extended info carried by stored leases.
    ///
    /// Returns the number of leases that contributed at least one identifier.
    /// With tables disabled the tables are only cleared.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` on a broken single-threaded contract.
    pub fn rebuild_extended_info_tables(&self) -> Result<usize> {
        let index = self.extended_info_tables;
        let (leases, indexed, relay_ids, remote_ids) =
            self.tables.write("rebuild_extended_info_tables", |tables| {
                tables.extended_info.clear();
                if !index {
                    return (tables.leases.len(), 0, 0, 0);
                }
                let Tables { leases, extended_info } = tables;
                let indexed =
                    leases.iter().filter(|lease| extended_info.index_lease(lease) > 0).count();
                (
                    leases.len(),
                    indexed,
                    extended_info.table(IdentifierTable::Relay).identifier_count(),
                    extended_info.table(IdentifierTable::Remote).identifier_count(),
                )
            })?;

        tracing::debug!(
            leases,
            indexed,
            relay_ids,
            remote_ids,
            relay_pairs = self.relay_id_count()?,
            remote_pairs = self.remote_id_count()?,
            "Rebuilt extended info tables"
        );
        Ok(indexed)
    }

    // =========================================================================
    // Paged queries
    // =========================================================================

    /// Returns up to `page_size` leases relayed by `relay_id`, in ascending
    /// address order, with address strictly above `lower_bound`.
    ///
    /// `link_addr` of `::` disables the link filter; otherwise only leases
    /// within `link_addr/link_len` are returned.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidPrefixLength`] if `link_len` exceeds 128.
    pub fn get_leases_by_relay_id(
        &self,
        relay_id: &[u8],
        link_addr: Ipv6Addr,
        link_len: u8,
        lower_bound: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Result<Vec<Lease6>> {
        self.get_leases_by_identifier(
            IdentifierTable::Relay,
            relay_id,
            link_addr,
            link_len,
            lower_bound,
            page_size,
        )
    }

    /// Returns up to `page_size` leases relayed on behalf of `remote_id`, in
    /// ascending address order, with address strictly above `lower_bound`.
    ///
    /// Link filtering is as for [`get_leases_by_relay_id`](Self::get_leases_by_relay_id).
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidPrefixLength`] if `link_len` exceeds 128.
    pub fn get_leases_by_remote_id(
        &self,
        remote_id: &[u8],
        link_addr: Ipv6Addr,
        link_len: u8,
        lower_bound: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Result<Vec<Lease6>> {
        self.get_leases_by_identifier(
            IdentifierTable::Remote,
            remote_id,
            link_addr,
            link_len,
            lower_bound,
            page_size,
        )
    }

    fn get_leases_by_identifier(
        &self,
        table: IdentifierTable,
        identifier: &[u8],
        link_addr: Ipv6Addr,
        link_len: u8,
        lower_bound: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Result<Vec<Lease6>> {
        let link = LinkFilter::new(link_addr, link_len)?;
        let page_size = self.clamp_page(page_size);

        let leases = if self.extended_info_tables {
            self.tables.read("get_leases_by_identifier", |tables| {
                tables.query().by_identifier(table, identifier, &link, lower_bound, page_size)
            })?
        } else {
            Vec::new()
        };

        tracing::debug!(
            table = %table,
            identifier = %hex::encode(identifier),
            link = %link,
            lower_bound = %lower_bound,
            page_size = page_size.get(),
            count = leases.len(),
            "Queried leases by identifier"
        );
        Ok(leases)
    }

    /// Returns up to `page_size` leases within `link_addr/link_len`, in
    /// ascending address order, with address strictly above `lower_bound`.
    ///
    /// `link_addr` of `::` pages over every lease.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseError::InvalidPrefixLength`] if `link_len` exceeds 128.
    pub fn get_leases_by_link(
        &self,
        link_addr: Ipv6Addr,
        link_len: u8,
        lower_bound: Ipv6Addr,
        page_size: LeasePageSize,
    ) -> Result<Vec<Lease6>> {
        let link = LinkFilter::new(link_addr, link_len)?;
        let page_size = self.clamp_page(page_size);

        let leases = self.tables.read("get_leases_by_link", |tables| {
            tables.query().by_link(&link, lower_bound, page_size)
        })?;

        tracing::debug!(
            link = %link,
            lower_bound = %lower_bound,
            page_size = page_size.get(),
            count = leases.len(),
            "Queried leases by link"
        );
        Ok(leases)
    }

    fn clamp_page(&self, requested: LeasePageSize) -> LeasePageSize {
        let page_size = requested.clamp_to(self.max_page);
        if page_size != requested {
            tracing::debug!(
                requested = requested.get(),
                max_page_size = self.max_page.get(),
                "Clamped page size"
            );
        }
        page_size
    }
}

/// Replaces the index entries for `address` with those of the stored lease.
fn reindex(tables: &mut Tables, address: Ipv6Addr) {
    tables.extended_info.delete_for_address(address);
    if let Some(lease) = tables.leases.get(address) {
        tables.extended_info.index_lease(lease);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use lease6_types::{Duid, ErrorCode, ExtendedInfo, RelayInfo};

    use super::*;

    fn addr(s: &str) -> Ipv6Addr {
        s.parse().unwrap()
    }

    fn page(n: usize) -> LeasePageSize {
        LeasePageSize::new(n).unwrap()
    }

    fn relayed_lease(address: &str, relay_id: &[u8], remote_id: &[u8]) -> Lease6 {
        let relay = RelayInfo::builder()
            .hop(0)
            .relay_id(relay_id.to_vec())
            .remote_id(remote_id.to_vec())
            .build();
        Lease6::builder()
            .address(addr(address))
            .duid(Duid::new(b"client".to_vec()).unwrap())
            .extended_info(ExtendedInfo::new(vec![relay]))
            .build()
    }

    fn manager(extended_info_tables: bool) -> LeaseManager {
        let config =
            LeaseStoreConfig::builder().extended_info_tables(extended_info_tables).build().unwrap();
        LeaseManager::new(config).unwrap()
    }

    #[test]
    fn test_manager_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LeaseManager>();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = LeaseStoreConfig { max_page_size: 0, ..LeaseStoreConfig::default() };
        let err = LeaseManager::new(config).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Config);
    }

    #[test]
    fn test_add_lease_indexes_extended_info() {
        let m = manager(true);
        assert!(m.add_lease(relayed_lease("2001:db8::1", b"relay", b"remote")).unwrap());
        assert_eq!(m.relay_id_count().unwrap(), 1);
        assert_eq!(m.remote_id_count().unwrap(), 1);

        let got = m.get_leases_by_remote_id(b"remote", ZERO_ADDRESS, 0, ZERO_ADDRESS, page(10)).unwrap();
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn test_add_lease_refuses_duplicate_without_indexing_it() {
        let m = manager(true);
        assert!(m.add_lease(relayed_lease("2001:db8::1", b"first", b"r")).unwrap());
        assert!(!m.add_lease(relayed_lease("2001:db8::1", b"second", b"r")).unwrap());

        assert!(m
            .get_leases_by_relay_id(b"second", ZERO_ADDRESS, 0, ZERO_ADDRESS, page(10))
            .unwrap()
            .is_empty());
        assert_eq!(m.relay_id_count().unwrap(), 1);
    }

    #[test]
    fn test_add_lease_keeps_manual_index_entries() {
        let m = manager(true);
        m.add_relay_id(addr("2001:db8::1"), b"manual").unwrap();
        m.add_lease(relayed_lease("2001:db8::1", b"relay", b"remote")).unwrap();
        assert_eq!(m.relay_id_count().unwrap(), 2);
    }

    #[test]
    fn test_update_lease_reindexes() {
        let m = manager(true);
        m.add_lease(relayed_lease("2001:db8::1", b"old", b"remote")).unwrap();
        m.update_lease(relayed_lease("2001:db8::1", b"new", b"remote")).unwrap();

        assert!(m
            .get_leases_by_relay_id(b"old", ZERO_ADDRESS, 0, ZERO_ADDRESS, page(10))
            .unwrap()
            .is_empty());
        assert_eq!(
            m.get_leases_by_relay_id(b"new", ZERO_ADDRESS, 0, ZERO_ADDRESS, page(10)).unwrap().len(),
            1
        );
        assert_eq!(m.relay_id_count().unwrap(), 1);
    }

    #[test]
    fn test_update_missing_lease_fails() {
        let m = manager(true);
        let err = m.update_lease(relayed_lease("2001:db8::1", b"a", b"b")).unwrap_err();
        assert!(matches!(err, LeaseError::LeaseNotFound { .. }));
        assert_eq!(m.relay_id_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_lease_purges_index() {
        let m = manager(true);
        m.add_lease(relayed_lease("2001:db8::1", b"relay", b"remote")).unwrap();
        assert!(m.delete_lease(addr("2001:db8::1")).unwrap());
        assert!(!m.delete_lease(addr("2001:db8::1")).unwrap());
        assert_eq!(m.relay_id_count().unwrap(), 0);
        assert_eq!(m.remote_id_count().unwrap(), 0);
        assert!(m.get_lease(addr("2001:db8::1")).unwrap().is_none());
    }

    #[test]
    fn test_empty_identifier_is_rejected_even_when_disabled() {
        for enabled in [true, false] {
            let err = manager(enabled).add_remote_id(addr("2001:db8::1"), b"").unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidIdentifier);
        }
    }

    #[test]
    fn test_disabled_tables() {
        let m = manager(false);
        assert!(!m.extended_info_tables_enabled());
        m.add_lease(relayed_lease("2001:db8::1", b"relay", b"remote")).unwrap();
        m.add_relay_id(addr("2001:db8::1"), b"relay").unwrap();

        assert_eq!(m.relay_id_count().unwrap(), 0);
        assert_eq!(m.delete_extended_info(addr("2001:db8::1")).unwrap(), 0);
        assert!(m
            .get_leases_by_relay_id(b"relay", ZERO_ADDRESS, 0, ZERO_ADDRESS, page(10))
            .unwrap()
            .is_empty());
        assert_eq!(m.get_leases_by_link(ZERO_ADDRESS, 0, ZERO_ADDRESS, page(10)).unwrap().len(), 1);
        assert_eq!(m.rebuild_extended_info_tables().unwrap(), 0);
    }

    #[test]
    fn test_invalid_prefix_length() {
        let m = manager(true);
        let err = m
            .get_leases_by_link(addr("2001:db8::"), 129, ZERO_ADDRESS, page(1))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPrefixLength);
        let err = m
            .get_leases_by_relay_id(b"id", ZERO_ADDRESS, 200, ZERO_ADDRESS, page(1))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPrefixLength);
    }

    #[test]
    fn test_page_size_is_clamped_to_config() {
        let config = LeaseStoreConfig::builder().max_page_size(2).build().unwrap();
        let m = LeaseManager::new(config).unwrap();
        for i in 1..=5u16 {
            m.add_lease(relayed_lease(&format!("2001:db8::{i}"), b"r", b"x")).unwrap();
        }
        assert_eq!(m.get_leases_paged(ZERO_ADDRESS, page(100)).unwrap().len(), 2);
    }

    #[test]
    fn test_wipe_and_rebuild() {
        let m = manager(true);
        m.add_lease(relayed_lease("2001:db8::1", b"r1", b"x1")).unwrap();
        m.add_lease(relayed_lease("2001:db8::2", b"r2", b"x2")).unwrap();
        m.add_lease(
            Lease6::builder()
                .address(addr("2001:db8::3"))
                .duid(Duid::new(b"plain".to_vec()).unwrap())
                .build(),
        )
        .unwrap();
        m.add_relay_id(addr("2001:db8::3"), b"manual").unwrap();

        m.wipe_extended_info_tables().unwrap();
        assert_eq!(m.relay_id_count().unwrap(), 0);
        assert_eq!(m.lease_count().unwrap(), 3);

        assert_eq!(m.rebuild_extended_info_tables().unwrap(), 2);
        assert_eq!(m.relay_id_count().unwrap(), 2);
        assert_eq!(m.remote_id_count().unwrap(), 2);
    }

    #[test]
    fn test_get_leases_is_ordered() {
        let m = manager(true);
        for a in ["2001:db8::9", "2001:db8::1", "2001:db8::5"] {
            m.add_lease(relayed_lease(a, b"r", b"x")).unwrap();
        }
        let got: Vec<_> = m.get_leases().unwrap().into_iter().map(|l| l.address).collect();
        assert_eq!(got, vec![addr("2001:db8::1"), addr("2001:db8::5"), addr("2001:db8::9")]);
    }
}
