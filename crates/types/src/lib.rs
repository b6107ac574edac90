//! Core types, errors, and configuration for the lease6 store.
//!
//! This crate provides the foundational types used throughout the store:
//! - Lease records (`Lease6`), client identity (`Duid`), and relay information
//! - Address ordering, link prefixes, and the zero-address sentinel
//! - Page sizes for cursor-paginated queries
//! - Error types using snafu
//! - Store configuration

#![deny(unsafe_code)]

pub mod address;
pub mod config;
pub mod error;
pub mod page;
pub mod types;

// Re-export commonly used types at crate root
pub use address::{LinkFilter, MAX_PREFIX_LENGTH, ZERO_ADDRESS, is_zero};
pub use config::{ConfigError, LeaseStoreConfig, ThreadingMode};
pub use error::{ErrorCode, LeaseError, Result};
pub use page::{LeasePageSize, MAX_LEASE_PAGE_SIZE};
pub use types::*;
