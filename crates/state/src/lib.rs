//! In-memory DHCPv6 lease state.
//!
//! This crate holds the lease tables and the queries served over them:
//!
//! - Primary lease store ordered by address
//! - Relay-id and remote-id lookup tables derived from relay information
//! - Cursor-paginated queries by identifier or by link
//! - Threading-mode aware access (single-threaded or multi-threaded)
//! - [`LeaseManager`], the facade the rest of a server uses

#![deny(unsafe_code)]

mod extended_info;
mod guard;
mod lease_store;
mod manager;
mod query;

pub use extended_info::{ExtendedInfoIndex, IdentifierIndex};
pub use guard::ConcurrencyGuard;
pub use lease_store::LeaseStore;
pub use manager::LeaseManager;
pub use query::QueryEngine;
